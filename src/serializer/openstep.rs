//! OpenStep ASCII property list writer.
//!
//! Only strings, arrays and dictionaries exist in this dialect; callers
//! downgrade integers and booleans first. Objects in the `objects` table are
//! grouped by `isa` between section comments, the way the IDE writes them.

use std::collections::BTreeMap;

use super::SerializeError;
use super::value::PlistValue;

/// Encoding marker on the first line of every project file.
pub const HEADER: &str = "// !$*UTF8*$!";

/// Render a document in the ASCII dialect.
///
/// # Errors
///
/// Returns [`SerializeError::UnsupportedValue`] for integers and booleans and
/// [`SerializeError::NulCharacter`] for strings holding NUL.
pub fn write_document(document: &PlistValue) -> Result<String, SerializeError> {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');
    let PlistValue::Dict(entries) = document else {
        return Err(SerializeError::UnsupportedValue {
            kind: document.kind(),
            context: "document root",
        });
    };
    out.push_str("{\n");
    for (key, value) in entries {
        indent(&mut out, 1);
        write_string(&mut out, key)?;
        out.push_str(" = ");
        match (key.as_str(), value) {
            ("objects", PlistValue::Dict(objects)) => write_objects(&mut out, objects)?,
            _ => write_value(&mut out, value, 1)?,
        }
        out.push_str(";\n");
    }
    out.push_str("}\n");
    Ok(out)
}

fn write_objects(
    out: &mut String,
    objects: &BTreeMap<String, PlistValue>,
) -> Result<(), SerializeError> {
    let mut sections: BTreeMap<&str, Vec<(&String, &PlistValue)>> = BTreeMap::new();
    for (gid, object) in objects {
        let isa = object.get("isa").and_then(PlistValue::as_str).unwrap_or("");
        sections.entry(isa).or_default().push((gid, object));
    }
    out.push_str("{\n");
    for (isa, members) in sections {
        out.push_str(&format!("\n/* Begin {isa} section */\n"));
        for (gid, object) in members {
            indent(out, 2);
            write_string(out, gid)?;
            out.push_str(" = ");
            write_value(out, object, 2)?;
            out.push_str(";\n");
        }
        out.push_str(&format!("/* End {isa} section */\n"));
    }
    indent(out, 1);
    out.push('}');
    Ok(())
}

fn write_value(out: &mut String, value: &PlistValue, depth: usize) -> Result<(), SerializeError> {
    match value {
        PlistValue::String(text) => write_string(out, text),
        PlistValue::Array(items) => {
            out.push_str("(\n");
            for item in items {
                indent(out, depth + 1);
                write_value(out, item, depth + 1)?;
                out.push_str(",\n");
            }
            indent(out, depth);
            out.push(')');
            Ok(())
        }
        PlistValue::Dict(entries) => {
            out.push_str("{\n");
            let isa = entries.get_key_value("isa");
            let rest = entries.iter().filter(|(key, _)| key.as_str() != "isa");
            for (key, entry) in isa.into_iter().chain(rest) {
                indent(out, depth + 1);
                write_string(out, key)?;
                out.push_str(" = ");
                write_value(out, entry, depth + 1)?;
                out.push_str(";\n");
            }
            indent(out, depth);
            out.push('}');
            Ok(())
        }
        PlistValue::Integer(_) | PlistValue::Bool(_) => Err(SerializeError::UnsupportedValue {
            kind: value.kind(),
            context: "ASCII property list",
        }),
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}

/// Whether `text` can be written without quotes.
#[must_use]
pub fn is_bare(text: &str) -> bool {
    !text.is_empty()
        && !text.contains("//")
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '/' | ':' | '.' | '-'))
}

fn write_string(out: &mut String, text: &str) -> Result<(), SerializeError> {
    if text.contains('\0') {
        return Err(SerializeError::NulCharacter {
            text: text.replace('\0', "\\0"),
        });
    }
    if is_bare(text) {
        out.push_str(text);
        return Ok(());
    }
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c if c.is_ascii_control() => out.push_str(&format!("\\U{:04x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
    Ok(())
}

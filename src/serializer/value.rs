//! Logical property list values shared by both encodings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A property list value.
///
/// Dictionaries keep their keys sorted, so two documents with the same
/// content compare equal regardless of how they were assembled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlistValue {
    /// Text.
    String(String),
    /// Signed integer.
    Integer(i64),
    /// Boolean flag.
    Bool(bool),
    /// Ordered list.
    Array(Vec<PlistValue>),
    /// Key-sorted dictionary.
    Dict(BTreeMap<String, PlistValue>),
}

/// A complete serialized project, as a property list tree.
pub type Document = PlistValue;

impl PlistValue {
    /// Render integers and booleans as strings, recursively.
    ///
    /// Booleans become `1` or `0`, matching how the IDE writes them.
    #[must_use]
    pub fn downgrade(self) -> Self {
        match self {
            Self::String(_) => self,
            Self::Integer(value) => Self::String(value.to_string()),
            Self::Bool(value) => Self::String(if value { "1" } else { "0" }.to_owned()),
            Self::Array(items) => Self::Array(items.into_iter().map(Self::downgrade).collect()),
            Self::Dict(entries) => Self::Dict(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, value.downgrade()))
                    .collect(),
            ),
        }
    }

    /// Kind name used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Bool(_) => "boolean",
            Self::Array(_) => "array",
            Self::Dict(_) => "dictionary",
        }
    }

    /// The text of a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(text) => Some(text),
            _ => None,
        }
    }

    /// The entries of a dictionary value.
    #[must_use]
    pub const fn as_dict(&self) -> Option<&BTreeMap<String, Self>> {
        match self {
            Self::Dict(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a dictionary entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        self.as_dict().and_then(|entries| entries.get(key))
    }
}

impl From<&str> for PlistValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for PlistValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for PlistValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for PlistValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<Self>> From<Vec<T>> for PlistValue {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Self>> for PlistValue {
    fn from(entries: BTreeMap<String, Self>) -> Self {
        Self::Dict(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn downgrade_renders_scalars_as_strings() {
        let value = PlistValue::from(vec![
            PlistValue::Integer(46),
            PlistValue::Bool(true),
            PlistValue::Bool(false),
            PlistValue::from("x"),
        ]);
        assert_eq!(
            value.downgrade(),
            PlistValue::from(vec!["46", "1", "0", "x"])
        );
    }

    #[rstest]
    #[case("\"a\"", PlistValue::from("a"))]
    #[case("7", PlistValue::Integer(7))]
    #[case("false", PlistValue::Bool(false))]
    fn untagged_json_scalars(#[case] json: &str, #[case] expected: PlistValue) {
        let parsed: PlistValue = serde_json::from_str(json).expect("json scalar");
        assert_eq!(parsed, expected);
    }

    #[rstest]
    fn json_floats_are_rejected() {
        assert!(serde_json::from_str::<PlistValue>("1.5").is_err());
    }
}

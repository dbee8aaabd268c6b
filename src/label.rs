//! Normalized Bazel target labels.
//!
//! A [`BuildLabel`] wraps the textual `//package:name` form of a target. The
//! accessors never panic: malformed shapes such as `//`, a bare word without
//! separators, or a trailing slash simply report no target name.
//!
//! ```
//! use xcbazel::label::BuildLabel;
//!
//! let label = BuildLabel::parse("//app/ios:Demo").expect("valid label");
//! assert_eq!(label.package_name(), Some("app/ios"));
//! assert_eq!(label.target_name(), Some("Demo"));
//! assert_eq!(label.as_file_name().as_deref(), Some("app/ios/Demo"));
//! ```

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use miette::Diagnostic;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors raised when a label string cannot be normalized.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum LabelError {
    /// The label string was empty after trimming.
    #[error("label is empty")]
    #[diagnostic(code(xcbazel::label::empty))]
    Empty,
    /// The label contained whitespace, which Bazel never emits.
    #[error("label '{label}' contains whitespace")]
    #[diagnostic(code(xcbazel::label::whitespace))]
    Whitespace {
        /// The offending label text.
        label: String,
    },
}

/// A normalized identifier of one upstream build target.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BuildLabel(String);

impl BuildLabel {
    /// Parse and normalize a label string.
    ///
    /// Surrounding whitespace is trimmed. Relative forms such as `pkg:name`
    /// gain the `//` prefix and the `//pkg/name` shorthand expands to
    /// `//pkg/name:name`, so equivalent spellings compare equal. Shapes that
    /// have no target name are kept as written; callers query
    /// [`Self::target_name`] to find out.
    ///
    /// # Errors
    ///
    /// Returns [`LabelError`] when the string is empty or embeds whitespace.
    pub fn parse(value: &str) -> Result<Self, LabelError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(LabelError::Empty);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(LabelError::Whitespace {
                label: trimmed.to_owned(),
            });
        }
        Ok(Self(normalize(trimmed)))
    }

    /// The normalized label text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The portion after the last `:`, or after the last `/` when no `:`
    /// exists.
    #[must_use]
    pub fn target_name(&self) -> Option<&str> {
        let text = self.0.as_str();
        if let Some((_, name)) = text.rsplit_once(':') {
            return non_empty(name);
        }
        match text.rsplit_once('/') {
            Some((_, name)) => non_empty(name),
            None => None,
        }
    }

    /// Everything before the `:` with a leading `//` removed.
    ///
    /// Labels without a usable target name report an empty package.
    #[must_use]
    pub fn package_name(&self) -> Option<&str> {
        if self.target_name().is_none() {
            return Some("");
        }
        let text = self.0.as_str();
        let package = text.split_once(':').map_or(text, |(package, _)| package);
        Some(package.strip_prefix("//").unwrap_or(package))
    }

    /// A filesystem-safe name built from the package segments and target name.
    #[must_use]
    pub fn as_file_name(&self) -> Option<String> {
        self.joined_segments("/", str::to_owned)
    }

    /// Package path segments joined with `-`, used when renaming colliding
    /// targets.
    #[must_use]
    pub fn package_dash_name(&self) -> Option<String> {
        self.joined_segments("-", sanitize_segment)
    }

    fn joined_segments(&self, separator: &str, segment: fn(&str) -> String) -> Option<String> {
        let target = self.target_name()?;
        let package = self.package_name()?;
        let mut parts: Vec<String> = package
            .split('/')
            .filter(|s| !s.is_empty())
            .map(segment)
            .collect();
        parts.push(target.to_owned());
        Some(parts.join(separator))
    }
}

/// Canonical spelling of a trimmed, whitespace-free label.
///
/// Bare words carry no package separator and stay malformed as written.
fn normalize(text: &str) -> String {
    if !text.contains(':') && !text.contains('/') {
        return text.to_owned();
    }
    let prefixed = if text.starts_with("//") || text.starts_with('@') {
        text.to_owned()
    } else {
        format!("//{text}")
    };
    if prefixed.contains(':') {
        return prefixed;
    }
    match prefixed.rsplit_once('/') {
        Some((_, name)) if !name.is_empty() => format!("{prefixed}:{name}"),
        _ => prefixed,
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() { None } else { Some(value) }
}

fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl Display for BuildLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for BuildLabel {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for BuildLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for BuildLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

//! Fluent builder for extraction records.
//!
//! # Examples
//!
//! ```rust
//! use test_support::RecordBuilder;
//!
//! let record = RecordBuilder::new("//app:App", "ios_application")
//!     .srcs(["app/main.m"])
//!     .dep("//lib:Lib")
//!     .build();
//! assert_eq!(record.deps, ["//lib:Lib"]);
//! ```

use serde_json::Value;
use xcbazel::rule_entry::ExtractionRecord;

/// Builds an [`ExtractionRecord`] with an explicit, empty generated file
/// list unless one is set.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    record: ExtractionRecord,
}

impl RecordBuilder {
    /// Start a record for `label` of class `rule_type`.
    pub fn new(label: &str, rule_type: &str) -> Self {
        Self {
            record: ExtractionRecord {
                label: label.to_owned(),
                rule_type: rule_type.to_owned(),
                generated_files: Some(Vec::new()),
                ..ExtractionRecord::default()
            },
        }
    }

    /// Set the source files.
    pub fn srcs<I, S>(mut self, srcs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.record.srcs = srcs.into_iter().map(Into::into).collect();
        self
    }

    /// Set the generated files.
    pub fn generated<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.record.generated_files = Some(files.into_iter().map(Into::into).collect());
        self
    }

    /// Drop the generated file list so the generator has to infer it.
    pub fn without_generated_list(mut self) -> Self {
        self.record.generated_files = None;
        self
    }

    /// Mark sources as compiled without ARC.
    pub fn non_arc<I, S>(mut self, srcs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.record.non_arc_srcs = srcs.into_iter().map(Into::into).collect();
        self
    }

    /// Add a strong dependency.
    pub fn dep(mut self, label: &str) -> Self {
        self.record.deps.push(label.to_owned());
        self
    }

    /// Add a weak dependency.
    pub fn weak_dep(mut self, label: &str) -> Self {
        self.record.weak_deps.push(label.to_owned());
        self
    }

    /// Add an extension.
    pub fn extension(mut self, label: &str) -> Self {
        self.record.extensions.push(label.to_owned());
        self
    }

    /// Set the test host.
    pub fn test_host(mut self, label: &str) -> Self {
        self.record.test_host = Some(label.to_owned());
        self
    }

    /// Set the bundle identifier.
    pub fn bundle_id(mut self, bundle_id: &str) -> Self {
        self.record.bundle_id = Some(bundle_id.to_owned());
        self
    }

    /// Set the extension point.
    pub fn extension_point(mut self, identifier: &str) -> Self {
        self.record.extension_point_identifier = Some(identifier.to_owned());
        self
    }

    /// Set the minimum deployment OS.
    pub fn minimum_os(mut self, version: &str) -> Self {
        self.record.minimum_os_version = Some(version.to_owned());
        self
    }

    /// Set the declaring BUILD file.
    pub fn build_file(mut self, path: &str) -> Self {
        self.record.build_file = Some(path.to_owned());
        self
    }

    /// Set one of the rule's own attributes.
    pub fn attribute(mut self, key: &str, value: Value) -> Self {
        self.record.attributes.insert(key.to_owned(), value);
        self
    }

    /// Finish the record.
    pub fn build(self) -> ExtractionRecord {
        self.record
    }
}

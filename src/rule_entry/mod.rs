//! Per-target build graph records.
//!
//! The extraction stage hands over one [`ExtractionRecord`] per Bazel target.
//! [`RuleEntry::from_record`] normalizes it: labels are parsed, file lists are
//! split into sources and generated outputs, and the three attribute layers
//! are kept separately so [`RuleEntry::merged_attributes`] can overlay them.

mod attributes;
mod generated;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::label::BuildLabel;
use crate::report::{Report, Warning};

pub use attributes::{AttributeLayers, AttributeMap, AttributeValue};

/// Structured per-target metadata emitted by the extraction stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionRecord {
    /// Label of the target.
    pub label: String,
    /// Bazel rule class, e.g. `ios_application`.
    pub rule_type: String,
    /// The rule's own attributes.
    pub attributes: AttributeMap,
    /// Attributes inherited from the binary dependency of a bundle rule.
    pub inheritable_attributes: AttributeMap,
    /// Attributes propagated from any dependency.
    pub transitive_attributes: AttributeMap,
    /// Source files, workspace relative.
    pub srcs: Vec<String>,
    /// Generated files. `None` when the extractor did not report them.
    pub generated_files: Option<Vec<String>>,
    /// Sources compiled without ARC.
    pub non_arc_srcs: Vec<String>,
    /// Strong dependencies.
    pub deps: Vec<String>,
    /// Aggregation-only dependencies such as test suite members.
    pub weak_deps: Vec<String>,
    /// Embedded sub-products.
    pub extensions: Vec<String>,
    /// Application hosting this test rule.
    pub test_host: Option<String>,
    /// Bundle identifier of the product.
    pub bundle_id: Option<String>,
    /// Extension point of an app extension.
    pub extension_point_identifier: Option<String>,
    /// `ios`, `macos`, `tvos` or `watchos`.
    pub platform_type: Option<String>,
    /// Minimum deployment OS version.
    pub minimum_os_version: Option<String>,
    /// Implicit archive produced alongside the primary output.
    pub secondary_artifact: Option<String>,
    /// Workspace-relative path of the declaring BUILD file.
    pub build_file: Option<String>,
}

/// One upstream build target.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleEntry {
    /// Label of the rule.
    pub label: BuildLabel,
    /// Bazel rule class.
    pub rule_type: String,
    /// Own, inheritable and transitive attributes.
    pub attributes: AttributeLayers,
    /// Pre-existing source files.
    pub source_files: Vec<String>,
    /// Generated files.
    pub generated_files: Vec<String>,
    /// Sources compiled without ARC.
    pub non_arc_files: BTreeSet<String>,
    /// Strong dependencies.
    pub dependencies: BTreeSet<BuildLabel>,
    /// Aggregation-only dependencies.
    pub weak_dependencies: BTreeSet<BuildLabel>,
    /// Embedded extension products.
    pub extensions: BTreeSet<BuildLabel>,
    /// Test host, when this is a test rule.
    pub test_host: Option<BuildLabel>,
    /// Bundle identifier.
    pub bundle_id: Option<String>,
    /// Extension point identifier.
    pub extension_point_identifier: Option<String>,
    /// Platform the rule targets.
    pub platform_type: Option<String>,
    /// Minimum OS version.
    pub minimum_os_version: Option<String>,
    /// Implicit secondary artifact label.
    pub secondary_artifact: Option<BuildLabel>,
    /// Originating BUILD file.
    pub build_file: Option<String>,
}

impl RuleEntry {
    /// Normalize an extraction record.
    ///
    /// Returns `None` when the record label itself is unusable; the skip is
    /// recorded in `report`. Unparsable references are reported and left out.
    pub fn from_record(record: &ExtractionRecord, report: &mut Report) -> Option<Self> {
        let Ok(label) = BuildLabel::parse(&record.label) else {
            report.warn(Warning::InvalidRecordLabel {
                raw: record.label.clone(),
            });
            return None;
        };

        let mut parse_refs = |raw: &[String]| -> BTreeSet<BuildLabel> {
            raw.iter()
                .filter_map(|dep| match BuildLabel::parse(dep) {
                    Ok(parsed) => Some(parsed),
                    Err(_) => {
                        report.warn(Warning::InvalidDependencyLabel {
                            owner: label.clone(),
                            raw: dep.clone(),
                        });
                        None
                    }
                })
                .collect()
        };
        let dependencies = parse_refs(&record.deps);
        let weak_dependencies = parse_refs(&record.weak_deps);
        let extensions = parse_refs(&record.extensions);
        let test_host = record
            .test_host
            .as_deref()
            .or_else(|| record_string_attribute(record, "test_host"))
            .and_then(|raw| parse_refs(&[raw.to_owned()]).into_iter().next());
        let secondary_artifact = record
            .secondary_artifact
            .as_deref()
            .and_then(|raw| parse_refs(&[raw.to_owned()]).into_iter().next());

        let (source_files, generated_files) = generated::split_sources(&label, record, report);

        Some(Self {
            rule_type: record.rule_type.clone(),
            attributes: AttributeLayers::new(
                &record.attributes,
                &record.inheritable_attributes,
                &record.transitive_attributes,
            ),
            source_files,
            generated_files,
            non_arc_files: record.non_arc_srcs.iter().cloned().collect(),
            dependencies,
            weak_dependencies,
            extensions,
            test_host,
            bundle_id: non_blank(record.bundle_id.as_deref()),
            extension_point_identifier: non_blank(record.extension_point_identifier.as_deref()),
            platform_type: non_blank(record.platform_type.as_deref())
                .or_else(|| platform_from_rule_type(&record.rule_type).map(str::to_owned)),
            minimum_os_version: non_blank(record.minimum_os_version.as_deref()),
            secondary_artifact,
            build_file: non_blank(record.build_file.as_deref()),
            label,
        })
    }

    /// Overlay of the three attribute layers; the transitive layer wins.
    #[must_use]
    pub fn merged_attributes(&self) -> AttributeMap {
        self.attributes.merged()
    }

    /// A merged attribute rendered as a string, when it is one.
    #[must_use]
    pub fn string_attribute(&self, key: &str) -> Option<String> {
        self.attributes
            .lookup(key)
            .and_then(AttributeValue::as_str)
            .map(str::to_owned)
    }

    /// A merged attribute rendered as a list of strings.
    #[must_use]
    pub fn string_list_attribute(&self, key: &str) -> Vec<String> {
        match self.attributes.lookup(key) {
            Some(AttributeValue::Array(items)) => items
                .iter()
                .filter_map(AttributeValue::as_str)
                .map(str::to_owned)
                .collect(),
            Some(AttributeValue::String(item)) => vec![item.clone()],
            _ => Vec::new(),
        }
    }

    /// Whether the rule produces a test bundle.
    #[must_use]
    pub fn is_test(&self) -> bool {
        self.rule_type.ends_with("_unit_test") || self.rule_type.ends_with("_ui_test")
    }

    /// Whether the rule carries or depends on Swift sources, according to
    /// its own data.
    #[must_use]
    pub fn is_swift_bearing(&self) -> bool {
        self.rule_type == "swift_library"
            || matches!(
                self.attributes.lookup("has_swift_dependency"),
                Some(AttributeValue::Bool(true))
            )
            || self
                .source_files
                .iter()
                .chain(&self.generated_files)
                .any(|f| f.ends_with(".swift"))
    }

    /// All labels this rule references, for dangling-reference checks.
    pub fn referenced_labels(&self) -> impl Iterator<Item = &BuildLabel> {
        self.dependencies
            .iter()
            .chain(&self.weak_dependencies)
            .chain(&self.extensions)
            .chain(self.test_host.as_ref())
    }
}

fn record_string_attribute<'a>(record: &'a ExtractionRecord, key: &str) -> Option<&'a str> {
    record.attributes.get(key).and_then(AttributeValue::as_str)
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Infer the platform from an Apple rule prefix such as `tvos_application`.
fn platform_from_rule_type(rule_type: &str) -> Option<&'static str> {
    ["ios", "macos", "tvos", "watchos"]
        .into_iter()
        .find(|platform| {
            rule_type
                .strip_prefix(platform)
                .is_some_and(|rest| rest.starts_with('_'))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn record() -> ExtractionRecord {
        ExtractionRecord {
            label: "//app:App".into(),
            rule_type: "ios_application".into(),
            srcs: vec!["app/main.m".into()],
            generated_files: Some(Vec::new()),
            deps: vec!["//lib:Lib".into(), "not a label".into()],
            ..ExtractionRecord::default()
        }
    }

    #[rstest]
    fn invalid_dependency_is_reported() {
        let mut report = Report::default();
        let entry = RuleEntry::from_record(&record(), &mut report).expect("entry");
        assert_eq!(entry.dependencies.len(), 1);
        assert_eq!(
            report.with_key("invalid_dependency_label").count(),
            1,
            "{report:?}"
        );
    }

    #[rstest]
    fn invalid_record_label_is_skipped() {
        let mut report = Report::default();
        let rec = ExtractionRecord {
            label: String::new(),
            ..record()
        };
        assert!(RuleEntry::from_record(&rec, &mut report).is_none());
        assert_eq!(report.warnings().first().map(Warning::key), Some("invalid_record_label"));
    }

    #[rstest]
    #[case("tvos_application", Some("tvos"))]
    #[case("ios_unit_test", Some("ios"))]
    #[case("iosx_application", None)]
    #[case("objc_library", None)]
    fn platform_inference(#[case] rule_type: &str, #[case] expected: Option<&str>) {
        assert_eq!(platform_from_rule_type(rule_type), expected);
    }

    #[rstest]
    #[case(vec!["app/main.m".to_owned()], Vec::new(), false)]
    #[case(vec!["app/main.swift".to_owned()], Vec::new(), true)]
    #[case(Vec::new(), vec!["bazel-out/gen/Api.swift".to_owned()], true)]
    fn swift_sources_of_either_kind_count(
        #[case] srcs: Vec<String>,
        #[case] generated: Vec<String>,
        #[case] expected: bool,
    ) {
        let rec = ExtractionRecord {
            rule_type: "objc_library".into(),
            srcs,
            generated_files: Some(generated),
            deps: Vec::new(),
            ..record()
        };
        let entry = RuleEntry::from_record(&rec, &mut Report::default()).expect("entry");
        assert_eq!(entry.is_swift_bearing(), expected);
    }

    #[rstest]
    fn test_host_falls_back_to_attribute() {
        let mut rec = record();
        rec.rule_type = "ios_unit_test".into();
        rec.attributes
            .insert("test_host".into(), json!("//app:Host"));
        let entry = RuleEntry::from_record(&rec, &mut Report::default()).expect("entry");
        assert_eq!(
            entry.test_host.as_ref().map(BuildLabel::as_str),
            Some("//app:Host")
        );
        assert!(entry.is_test());
    }
}

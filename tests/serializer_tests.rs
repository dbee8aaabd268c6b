#![allow(
    clippy::expect_used,
    reason = "serializer tests use expect for descriptive failures"
)]

//! Tests for identifier determinism and cross-format equivalence of
//! generated projects.

use rstest::{fixture, rstest};
use test_support::{RecordBuilder, hash::gid_salt, options};
use xcbazel::generator::{GeneratedProject, ProjectGenerator};
use xcbazel::report::Report;
use xcbazel::rule_entry::ExtractionRecord;
use xcbazel::rule_entry_map::RuleEntryMap;
use xcbazel::serializer::{BasicTypes, PlistValue, parse_object_table, parse_pbxproj};

#[fixture]
fn records() -> Vec<ExtractionRecord> {
    vec![
        RecordBuilder::new("//app:App", "ios_application")
            .dep("//app:Sources")
            .bundle_id("com.example.app")
            .build_file("app/BUILD")
            .build(),
        RecordBuilder::new("//app:Sources", "objc_library")
            .srcs(["app/main.m", "app/legacy.m", "app/App.h"])
            .non_arc(["app/legacy.m"])
            .build(),
        RecordBuilder::new("//app:Tests", "ios_unit_test")
            .test_host("//app:App")
            .build(),
    ]
}

fn generate(records: &[ExtractionRecord], project: &str) -> GeneratedProject {
    let mut report = Report::default();
    let map = RuleEntryMap::from_records(records, &mut report);
    let options = options(project, &["//app:App", "//app:Tests"]);
    ProjectGenerator::new(&options)
        .with_report(report)
        .generate(&map)
        .expect("generation succeeds")
}

#[rstest]
fn identical_input_gives_identical_bytes(records: Vec<ExtractionRecord>) {
    let first = generate(&records, "Demo");
    let second = generate(&records, "Demo");
    assert_eq!(first.pbxproj, second.pbxproj);
    assert_eq!(first.object_table, second.object_table);
    assert_eq!(first.build_settings, second.build_settings);
}

#[rstest]
fn identifiers_carry_the_project_salt(records: Vec<ExtractionRecord>) {
    let project = generate(&records, "Demo");
    let document = parse_object_table(&project.object_table).expect("table parses");
    let objects = document
        .get("objects")
        .and_then(PlistValue::as_dict)
        .expect("objects dict");
    let salt = gid_salt("Demo");
    assert!(!objects.is_empty());
    for gid in objects.keys() {
        assert_eq!(gid.len(), 24, "{gid}");
        assert!(gid.starts_with(&salt), "{gid} lacks salt {salt}");
        assert!(gid.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }
    let root = document
        .get("rootObject")
        .and_then(PlistValue::as_str)
        .expect("root object");
    assert_eq!(root, format!("{salt}{:016X}", 0));
}

#[rstest]
fn project_name_changes_every_identifier(records: Vec<ExtractionRecord>) {
    let demo = generate(&records, "Demo");
    let other = generate(&records, "Other");
    assert_ne!(demo.pbxproj, other.pbxproj);
}

#[rstest]
fn both_encodings_hold_the_same_document(records: Vec<ExtractionRecord>) {
    let project = generate(&records, "Demo");
    let from_table = parse_object_table(&project.object_table).expect("table parses");
    let from_ascii = parse_pbxproj(&project.pbxproj).expect("pbxproj parses");
    assert_eq!(BasicTypes::Downgrade.apply(from_table), from_ascii);
}

#[rstest]
fn ascii_form_marks_non_arc_sources(records: Vec<ExtractionRecord>) {
    let project = generate(&records, "Demo");
    let text = String::from_utf8(project.pbxproj).expect("utf-8");
    assert!(text.starts_with("// !$*UTF8*$!"));
    assert!(text.contains("COMPILER_FLAGS = -fno-objc-arc;"));
    assert_eq!(text.matches("COMPILER_FLAGS").count(), 1);
}

//! Test utilities for xcbazel.
//!
//! Builders for extraction records and generator options, plus helpers that
//! stage them on disk for end-to-end tests.

pub mod hash;
pub mod records;

pub use records::RecordBuilder;

use std::path::PathBuf;

use camino::Utf8PathBuf;
use tempfile::TempDir;
use xcbazel::label::BuildLabel;
use xcbazel::rule_entry::ExtractionRecord;
use xcbazel::settings::GeneratorOptions;

/// Parse a label, panicking on malformed test input.
pub fn label(text: &str) -> BuildLabel {
    BuildLabel::parse(text).expect("test label")
}

/// Options for a project named `name` rooted at `roots`.
pub fn options(name: &str, roots: &[&str]) -> GeneratorOptions {
    GeneratorOptions {
        project_name: name.to_owned(),
        workspace_root: Utf8PathBuf::from("/workspace"),
        roots: roots.iter().map(|root| label(root)).collect(),
        ..GeneratorOptions::default()
    }
}

/// Write `records` and `options` as JSON into a fresh temporary directory.
///
/// Returns the directory and the paths of both files.
pub fn stage_inputs(
    records: &[ExtractionRecord],
    options: &serde_json::Value,
) -> (TempDir, PathBuf, PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let records_path = dir.path().join("records.json");
    let options_path = dir.path().join("options.json");
    std::fs::write(
        &records_path,
        serde_json::to_vec_pretty(records).expect("encode records"),
    )
    .expect("write records");
    std::fs::write(
        &options_path,
        serde_json::to_vec_pretty(options).expect("encode options"),
    )
    .expect("write options");
    (dir, records_path, options_path)
}

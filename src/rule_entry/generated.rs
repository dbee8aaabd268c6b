//! Splitting record files into sources and generated outputs.
//!
//! The record's explicit `generated_files` list is authoritative. Records
//! from extractors that do not report it fall back to classifying sources by
//! their output-tree prefix, and the fallback is reported.

use crate::label::BuildLabel;
use crate::report::{Report, Warning};

use super::ExtractionRecord;

/// Path prefixes Bazel uses for output trees.
const OUTPUT_TREE_PREFIXES: [&str; 3] = ["bazel-out/", "bazel-bin/", "bazel-genfiles/"];

pub(super) fn split_sources(
    label: &BuildLabel,
    record: &ExtractionRecord,
    report: &mut Report,
) -> (Vec<String>, Vec<String>) {
    if let Some(generated) = &record.generated_files {
        return (record.srcs.clone(), generated.clone());
    }
    let (generated, sources): (Vec<String>, Vec<String>) = record
        .srcs
        .iter()
        .cloned()
        .partition(|path| is_output_path(path));
    if !generated.is_empty() {
        report.warn(Warning::GeneratedFilesInferred {
            label: label.clone(),
            count: generated.len(),
        });
    }
    (sources, generated)
}

fn is_output_path(path: &str) -> bool {
    OUTPUT_TREE_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
}

//! CLI execution.
//!
//! This module keeps `main` minimal: it loads the records and options named
//! on the command line, runs one generation pass, and writes the project
//! bundle.

mod error;
mod file_io;

pub use error::RunnerError;
pub use file_io::write_atomic;

use std::path::Path;

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info};

use crate::cli::Cli;
use crate::generator::{GeneratedProject, ProjectGenerator};
use crate::report::Report;
use crate::rule_entry::ExtractionRecord;
use crate::rule_entry_map::RuleEntryMap;
use crate::settings::GeneratorOptions;

/// Environment variable override for the Bazel binary.
pub use bazel_env::BAZEL_ENV;

/// File name of the ASCII project inside the bundle.
pub const PBXPROJ_FILE: &str = "project.pbxproj";
/// Bundle-relative path of the JSON identifier table.
pub const OBJECT_TABLE_FILE: &str = ".xcbazel/objects.json";
/// Bundle-relative path of the settings read by the build wrapper.
pub const BUILD_SETTINGS_FILE: &str = ".xcbazel/Scripts/bazel_build_settings.txt";

/// Execute the parsed [`Cli`].
///
/// # Errors
///
/// Returns an error when the inputs cannot be read or parsed, when generation
/// fails, or when the bundle cannot be written.
pub fn run(cli: &Cli) -> Result<()> {
    let records = load_records(&cli.records)?;
    let mut options = load_options(cli.options.as_deref())?;
    apply_bazel_override(&mut options, std::env::var(BAZEL_ENV).ok());
    let output = utf8_path(&cli.output)?;

    let mut report = Report::default();
    let map = RuleEntryMap::from_records(&records, &mut report);
    let project = ProjectGenerator::new(&options)
        .with_report(report)
        .generate(&map)
        .with_context(|| format!("generating project '{}'", options.project_name))?;
    let bundle = write_bundle(&output, &options.project_name, &project)?;
    info!(
        bundle = %bundle,
        warnings = project.report.warnings().len(),
        "project written"
    );
    Ok(())
}

/// Read the extraction records, a JSON array.
///
/// # Errors
///
/// Returns [`RunnerError::RecordsNotFound`] for a missing file and a
/// contextual error for unreadable or malformed JSON.
pub fn load_records(path: &Path) -> Result<Vec<ExtractionRecord>> {
    if !path.exists() {
        return Err(RunnerError::RecordsNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }
    let bytes =
        std::fs::read(path).with_context(|| format!("reading records {}", path.display()))?;
    let records: Vec<ExtractionRecord> = serde_json::from_slice(&bytes)
        .with_context(|| format!("parsing records {}", path.display()))?;
    debug!(count = records.len(), "loaded extraction records");
    Ok(records)
}

/// Read generator options, falling back to defaults without a file.
///
/// # Errors
///
/// Returns an error when the file cannot be read or parsed, or when the
/// project name cannot name a bundle.
pub fn load_options(path: Option<&Path>) -> Result<GeneratorOptions> {
    let options = match path {
        Some(file) => {
            let bytes = std::fs::read(file)
                .with_context(|| format!("reading options {}", file.display()))?;
            serde_json::from_slice(&bytes)
                .with_context(|| format!("parsing options {}", file.display()))?
        }
        None => GeneratorOptions::default(),
    };
    validate_project_name(&options.project_name)?;
    Ok(options)
}

fn validate_project_name(name: &str) -> Result<(), RunnerError> {
    if name.trim().is_empty() || name.contains('/') || name == "." || name == ".." {
        return Err(RunnerError::InvalidProjectName {
            name: name.to_owned(),
        });
    }
    Ok(())
}

/// Point the options at the Bazel binary named by [`BAZEL_ENV`], if any.
pub fn apply_bazel_override(options: &mut GeneratorOptions, value: Option<String>) {
    if let Some(bazel) = value.filter(|v| !v.trim().is_empty()) {
        debug!(%bazel, "using Bazel from {BAZEL_ENV}");
        options.bazel_path = Utf8PathBuf::from(bazel);
    }
}

fn utf8_path(path: &Path) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path.to_path_buf())
        .map_err(|rejected| RunnerError::NonUtf8Path { path: rejected }.into())
}

/// Write every generated file under `<output>/<name>.xcodeproj`.
///
/// # Errors
///
/// Returns an error when any file cannot be written.
pub fn write_bundle(
    output: &Utf8Path,
    project_name: &str,
    project: &GeneratedProject,
) -> Result<Utf8PathBuf> {
    let bundle = output.join(format!("{project_name}.xcodeproj"));
    write_atomic(&bundle.join(PBXPROJ_FILE), &project.pbxproj)?;
    write_atomic(&bundle.join(OBJECT_TABLE_FILE), &project.object_table)?;
    write_atomic(&bundle.join(BUILD_SETTINGS_FILE), &project.build_settings)?;
    Ok(bundle)
}

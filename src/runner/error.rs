//! Error types for the runner module.
//!
//! This submodule isolates derive-macro-affected code to scope lint
//! suppressions narrowly.

// Scoped suppression for version-dependent lint false positives from
// miette/thiserror derive macros. The unused_assignments lint fires in some
// Rust versions but not others, so `#[expect]` cannot be used here.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while preparing or writing a project.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    /// The records file does not exist.
    #[error("records file not found: {}", path.display())]
    #[diagnostic(
        code(xcbazel::runner::records_not_found),
        help("run the extraction step first, or pass --records")
    )]
    RecordsNotFound {
        /// The path that was attempted.
        path: PathBuf,
    },
    /// The project name cannot name a bundle directory.
    #[error("invalid project name '{name}'")]
    #[diagnostic(
        code(xcbazel::runner::invalid_project_name),
        help("set a non-empty `project_name` without path separators")
    )]
    InvalidProjectName {
        /// The rejected name.
        name: String,
    },
    /// A path is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", path.display())]
    #[diagnostic(code(xcbazel::runner::non_utf8_path))]
    NonUtf8Path {
        /// The offending path.
        path: PathBuf,
    },
}

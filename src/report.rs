//! Recoverable generation anomalies.
//!
//! Anything short of a fatal error is recorded as a [`Warning`] with a stable
//! lookup key. Each warning is logged when it is recorded and kept in the
//! [`Report`] returned to the caller, so tests and front ends can inspect the
//! degraded decisions the generator made.

use std::fmt::{self, Display, Formatter};

use crate::label::BuildLabel;

/// A recoverable anomaly encountered while building the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// An extraction record carried a label that could not be parsed.
    InvalidRecordLabel {
        /// Raw label text.
        raw: String,
    },
    /// A dependency entry of a record could not be parsed as a label.
    InvalidDependencyLabel {
        /// Rule owning the reference.
        owner: BuildLabel,
        /// Raw dependency text.
        raw: String,
    },
    /// A referenced label has no entry in the rule map.
    UnresolvedDependency {
        /// Rule owning the reference.
        owner: BuildLabel,
        /// Label that could not be found.
        missing: BuildLabel,
    },
    /// The dependency walk found a cycle.
    DependencyCycle {
        /// Canonical rotation of the cycle, first label repeated at the end.
        cycle: Vec<BuildLabel>,
    },
    /// A test rule names a host that was not generated.
    MissingTestHost {
        /// The test rule.
        test: BuildLabel,
        /// The host it names.
        host: BuildLabel,
    },
    /// An extension label could not be resolved.
    MissingExtension {
        /// The hosting rule.
        host: BuildLabel,
        /// The extension label.
        extension: BuildLabel,
    },
    /// A bridging header label resolved to nothing usable.
    MissingBridgingHeader {
        /// Rule declaring the header.
        owner: BuildLabel,
        /// Declared header.
        header: String,
    },
    /// A bundle rule has no bundle identifier.
    MissingBundleIdentifier {
        /// The bundle rule.
        label: BuildLabel,
    },
    /// An extension rule does not declare its extension point.
    AmbiguousBundleExtension {
        /// The extension rule.
        label: BuildLabel,
    },
    /// A caller-provided flag string could not be split.
    InvalidFlagString {
        /// `project` or the overridden label.
        scope: String,
    },
    /// Generated files were inferred from source paths rather than read from
    /// the record.
    GeneratedFilesInferred {
        /// The rule whose record lacked generated file data.
        label: BuildLabel,
        /// Number of files classified as generated.
        count: usize,
    },
}

impl Warning {
    /// Stable key used in logs and for lookups.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::InvalidRecordLabel { .. } => "invalid_record_label",
            Self::InvalidDependencyLabel { .. } => "invalid_dependency_label",
            Self::UnresolvedDependency { .. } => "unresolved_dependency",
            Self::DependencyCycle { .. } => "dependency_cycle",
            Self::MissingTestHost { .. } => "missing_test_host",
            Self::MissingExtension { .. } => "missing_extension",
            Self::MissingBridgingHeader { .. } => "missing_bridging_header",
            Self::MissingBundleIdentifier { .. } => "missing_bundle_identifier",
            Self::AmbiguousBundleExtension { .. } => "ambiguous_bundle_extension",
            Self::InvalidFlagString { .. } => "invalid_flag_string",
            Self::GeneratedFilesInferred { .. } => "generated_files_inferred",
        }
    }
}

impl Display for Warning {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRecordLabel { raw } => write!(f, "skipping record with label '{raw}'"),
            Self::InvalidDependencyLabel { owner, raw } => {
                write!(f, "{owner} references unparsable label '{raw}'")
            }
            Self::UnresolvedDependency { owner, missing } => {
                write!(f, "{owner} references unknown rule {missing}")
            }
            Self::DependencyCycle { cycle } => {
                let joined: Vec<&str> = cycle.iter().map(BuildLabel::as_str).collect();
                write!(f, "dependency cycle: {}", joined.join(" -> "))
            }
            Self::MissingTestHost { test, host } => {
                write!(f, "test host {host} for {test} was not generated")
            }
            Self::MissingExtension { host, extension } => {
                write!(f, "extension {extension} of {host} could not be resolved")
            }
            Self::MissingBridgingHeader { owner, header } => {
                write!(f, "bridging header {header} of {owner} could not be resolved")
            }
            Self::MissingBundleIdentifier { label } => {
                write!(f, "{label} has no bundle identifier")
            }
            Self::AmbiguousBundleExtension { label } => {
                write!(f, "{label} does not declare an extension point")
            }
            Self::InvalidFlagString { scope } => {
                write!(f, "ignoring {scope} flags with unbalanced quotes")
            }
            Self::GeneratedFilesInferred { label, count } => write!(
                f,
                "{label} carries no generated file list; inferred {count} from source paths"
            ),
        }
    }
}

/// Collected warnings of one generation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    warnings: Vec<Warning>,
}

impl Report {
    /// Log and record a warning.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!(key = warning.key(), "{warning}");
        self.warnings.push(warning);
    }

    /// All warnings in the order they were recorded.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Warnings carrying the given key.
    pub fn with_key<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Warning> + 'a {
        self.warnings.iter().filter(move |w| w.key() == key)
    }

    /// Whether no warnings were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}

//! Source indexing targets.
//!
//! Each rule with sources contributes one [`IndexerData`]. Data sharing a
//! precompiled header and a bridging header (absent counts as equal) merge
//! into a single static library target whose only phase compiles the
//! sources for the IDE's indexer.

use std::collections::btree_map::Entry;

use indexmap::IndexMap;

use crate::hasher::NameHasher;
use crate::label::BuildLabel;
use crate::project::{SettingValue, SettingsMap};
use crate::report::{Report, Warning};
use crate::rule_entry::RuleEntry;
use crate::rule_entry_map::RuleEntryMap;

use super::path_filter::PathFilter;

/// Upper bound on an indexer target name.
pub const MAX_NAME_LENGTH: usize = 255;
/// Hex digits of the name suffix.
const SUFFIX_DIGITS: usize = 8;
const NAME_PREFIX: &str = "_idx_";
/// Compiler flag for sources built without ARC.
pub const NON_ARC_FLAG: &str = "-fno-objc-arc";
/// Build setting through which workspace paths are spelled.
pub const WORKSPACE_ROOT_SETTING: &str = "$(BAZEL_WORKSPACE_ROOT)";

/// One source of an indexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerSource {
    /// Workspace-relative path.
    pub path: String,
    /// Whether the file is produced by the build.
    pub generated: bool,
    /// Whether the file is compiled without ARC.
    pub non_arc: bool,
}

/// Indexing inputs of one or more merged rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerData {
    /// Contributing rules.
    pub labels: Vec<BuildLabel>,
    /// Target names of the contributing rules.
    pub names: Vec<String>,
    /// Precompiled header path.
    pub pch: Option<String>,
    /// Bridging header path.
    pub bridging_header: Option<String>,
    /// Sources in contribution order.
    pub sources: Vec<IndexerSource>,
    /// Compiler settings.
    pub settings: SettingsMap,
}

impl IndexerData {
    /// Indexing data of one rule, or `None` when no source passes `filter`.
    ///
    /// Generated files bypass the filter; they live under the output tree
    /// rather than in a package.
    pub fn from_entry(
        entry: &RuleEntry,
        name: String,
        filter: &PathFilter,
        map: &RuleEntryMap,
        report: &mut Report,
    ) -> Option<Self> {
        let sources: Vec<IndexerSource> = entry
            .source_files
            .iter()
            .filter(|path| filter.accepts_file(path))
            .map(|path| (path, false))
            .chain(entry.generated_files.iter().map(|path| (path, true)))
            .map(|(path, generated)| IndexerSource {
                path: path.clone(),
                generated,
                non_arc: entry.non_arc_files.contains(path),
            })
            .collect();
        if sources.is_empty() {
            return None;
        }

        let bridging_header = bridging_header(entry, map, report);
        let pch = entry.string_attribute("pch");
        let settings = compiler_settings(entry, pch.as_deref(), bridging_header.as_deref());
        Some(Self {
            labels: vec![entry.label.clone()],
            names: vec![name],
            pch,
            bridging_header,
            sources,
            settings,
        })
    }

    /// Fold `other` into `self`: sources concatenate, settings union.
    pub fn absorb(&mut self, other: Self) {
        self.labels.extend(other.labels);
        self.names.extend(other.names);
        for source in other.sources {
            if !self.sources.iter().any(|s| s.path == source.path) {
                self.sources.push(source);
            }
        }
        for (key, value) in other.settings {
            match self.settings.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(value);
                }
                Entry::Occupied(mut slot) => {
                    if let (SettingValue::List(items), SettingValue::List(more)) =
                        (slot.get_mut(), value)
                    {
                        for item in more {
                            if !items.contains(&item) {
                                items.push(item);
                            }
                        }
                    }
                }
            }
        }
    }

    /// Bounded target name with a hash suffix over the contributing labels.
    #[must_use]
    pub fn target_name(&self) -> String {
        indexer_name(&self.names, &self.labels)
    }
}

/// Merge every compatible pair, keeping first-contribution order.
#[must_use]
pub fn merge(data: Vec<IndexerData>) -> Vec<IndexerData> {
    let mut merged: IndexMap<(Option<String>, Option<String>), IndexerData> = IndexMap::new();
    for item in data {
        let key = (item.pch.clone(), item.bridging_header.clone());
        if let Some(existing) = merged.get_mut(&key) {
            tracing::debug!(into = ?existing.labels, from = ?item.labels, "merging indexers");
            existing.absorb(item);
        } else {
            merged.insert(key, item);
        }
    }
    merged.into_values().collect()
}

/// `_idx_<names>_<hash>`, at most [`MAX_NAME_LENGTH`] bytes.
///
/// Over-long forms keep the first and last names around an `<n>_more`
/// marker and are truncated further if still too long. The suffix is always
/// kept.
#[must_use]
pub fn indexer_name(names: &[String], labels: &[BuildLabel]) -> String {
    let suffix = NameHasher::digest(labels.iter().map(BuildLabel::as_str), SUFFIX_DIGITS);
    let budget = MAX_NAME_LENGTH - NAME_PREFIX.len() - 1 - suffix.len();
    let mut body = names.join("_");
    if body.len() > budget
        && names.len() > 2
        && let (Some(first), Some(last)) = (names.first(), names.last())
    {
        body = format!("{first}_{}_more_{last}", names.len() - 2);
    }
    if body.len() > budget {
        body = truncate(&body, budget);
    }
    format!("{NAME_PREFIX}{body}_{suffix}")
}

fn truncate(text: &str, max_bytes: usize) -> String {
    let mut out = String::new();
    for c in text.chars() {
        if out.len() + c.len_utf8() > max_bytes {
            break;
        }
        out.push(c);
    }
    out
}

/// The bridging header path, resolving label references through `map`.
fn bridging_header(entry: &RuleEntry, map: &RuleEntryMap, report: &mut Report) -> Option<String> {
    let declared = entry.string_attribute("bridging_header")?;
    if !looks_like_label(&declared) {
        return Some(declared);
    }
    let resolved = BuildLabel::parse(&declared)
        .ok()
        .and_then(|label| map.get(&label))
        .and_then(|rule| {
            rule.source_files
                .iter()
                .chain(&rule.generated_files)
                .find(|path| path.ends_with(".h"))
                .cloned()
        });
    if resolved.is_none() {
        report.warn(Warning::MissingBridgingHeader {
            owner: entry.label.clone(),
            header: declared,
        });
    }
    resolved
}

fn looks_like_label(value: &str) -> bool {
    value.starts_with("//") || value.starts_with('@') || value.contains(':')
}

fn workspace_path(path: &str) -> String {
    format!("{WORKSPACE_ROOT_SETTING}/{path}")
}

fn compiler_settings(entry: &RuleEntry, pch: Option<&str>, bridging: Option<&str>) -> SettingsMap {
    let mut settings = SettingsMap::new();
    let mut list = |key: &str, values: Vec<String>| {
        if !values.is_empty() {
            settings.insert(key.to_owned(), SettingValue::List(values));
        }
    };
    list("OTHER_CFLAGS", entry.string_list_attribute("copts"));
    list(
        "GCC_PREPROCESSOR_DEFINITIONS",
        entry.string_list_attribute("defines"),
    );
    list("OTHER_SWIFT_FLAGS", entry.string_list_attribute("swiftc_opts"));
    let package = entry.label.package_name().unwrap_or_default();
    list(
        "HEADER_SEARCH_PATHS",
        entry
            .string_list_attribute("includes")
            .iter()
            .map(|include| workspace_path(&join_package(package, include)))
            .collect(),
    );
    if matches!(
        entry.attributes.lookup("enable_modules"),
        Some(serde_json::Value::Bool(true))
    ) {
        settings.insert("CLANG_ENABLE_MODULES".to_owned(), "YES".into());
    }
    if let Some(pch) = pch {
        settings.insert("GCC_PREFIX_HEADER".to_owned(), workspace_path(pch).into());
    }
    if let Some(header) = bridging {
        settings.insert(
            "SWIFT_OBJC_BRIDGING_HEADER".to_owned(),
            workspace_path(header).into(),
        );
    }
    settings
}

fn join_package(package: &str, path: &str) -> String {
    match (package.is_empty(), path) {
        (true, _) => path.to_owned(),
        (false, ".") => package.to_owned(),
        (false, _) => format!("{package}/{path}"),
    }
}

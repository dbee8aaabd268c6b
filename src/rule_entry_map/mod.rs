//! Label-indexed collection of rule entries.
//!
//! The map is assembled once from every extraction record and is read-only
//! afterwards. Lookups that fail are never fatal here; callers receive the
//! unresolved labels and decide how severe that is.

mod walk;

use std::collections::BTreeMap;

use crate::label::BuildLabel;
use crate::report::{Report, Warning};
use crate::rule_entry::{ExtractionRecord, RuleEntry};

pub use walk::Reachable;

/// Result of resolving a list of labels.
#[derive(Debug, Default)]
pub struct Resolution<'a> {
    /// Entries found, in request order.
    pub resolved: Vec<&'a RuleEntry>,
    /// Labels with no entry, in request order.
    pub unresolved: Vec<BuildLabel>,
}

/// Label to [`RuleEntry`] map.
#[derive(Debug, Clone, Default)]
pub struct RuleEntryMap {
    entries: BTreeMap<BuildLabel, RuleEntry>,
}

impl RuleEntryMap {
    /// Build the map from extraction records.
    ///
    /// Records with unusable labels are skipped and dangling references are
    /// reported, both through `report`. A later record for an already-seen
    /// label replaces the earlier one.
    pub fn from_records<'a, I>(records: I, report: &mut Report) -> Self
    where
        I: IntoIterator<Item = &'a ExtractionRecord>,
    {
        let mut map = Self::default();
        for record in records {
            if let Some(entry) = RuleEntry::from_record(record, report) {
                map.insert(entry);
            }
        }
        for (owner, missing) in map.dangling_references() {
            report.warn(Warning::UnresolvedDependency { owner, missing });
        }
        tracing::debug!(entries = map.len(), "assembled rule entry map");
        map
    }

    /// Insert an entry, replacing any previous entry for the same label.
    pub fn insert(&mut self, entry: RuleEntry) {
        if let Some(previous) = self.entries.insert(entry.label.clone(), entry) {
            tracing::debug!(label = %previous.label, "replaced duplicate rule entry");
        }
    }

    /// Look up one label.
    #[must_use]
    pub fn get(&self, label: &BuildLabel) -> Option<&RuleEntry> {
        self.entries.get(label)
    }

    /// Whether an entry exists for `label`.
    #[must_use]
    pub fn contains(&self, label: &BuildLabel) -> bool {
        self.entries.contains_key(label)
    }

    /// Resolve every label, splitting found from missing.
    #[must_use]
    pub fn resolve<'a, 'l, I>(&'a self, labels: I) -> Resolution<'a>
    where
        I: IntoIterator<Item = &'l BuildLabel>,
    {
        let mut resolution = Resolution::default();
        for label in labels {
            match self.entries.get(label) {
                Some(entry) => resolution.resolved.push(entry),
                None => resolution.unresolved.push(label.clone()),
            }
        }
        resolution
    }

    /// Every `(owner, missing)` pair where a referenced label has no entry.
    #[must_use]
    pub fn dangling_references(&self) -> Vec<(BuildLabel, BuildLabel)> {
        self.entries
            .values()
            .flat_map(|entry| {
                entry
                    .referenced_labels()
                    .filter(|label| !self.entries.contains_key(*label))
                    .map(|missing| (entry.label.clone(), missing.clone()))
            })
            .collect()
    }

    /// Entries reachable from `roots` through strong dependencies.
    #[must_use]
    pub fn reachable<'a>(&'a self, roots: &[&'a RuleEntry]) -> Reachable<'a> {
        walk::collect(self, roots)
    }

    /// Iterate entries in label order.
    pub fn iter(&self) -> impl Iterator<Item = &RuleEntry> {
        self.entries.values()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

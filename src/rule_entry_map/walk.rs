//! Deterministic dependency walk over the rule entry map.

use std::collections::HashMap;

use crate::label::BuildLabel;
use crate::rule_entry::RuleEntry;

use super::RuleEntryMap;

/// Where a rule stands in the walk: still on the dependency path, or fully
/// expanded.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Mark {
    OnPath,
    Expanded,
}

/// Entries reachable from a set of roots.
#[derive(Debug, Default)]
pub struct Reachable<'a> {
    /// Reachable entries in first-visit order, roots included.
    pub entries: Vec<&'a RuleEntry>,
    /// `(dependent, missing)` pairs met during the walk.
    pub missing_dependencies: Vec<(BuildLabel, BuildLabel)>,
    /// Dependency cycles, each canonically rotated with the first label
    /// repeated at the end.
    pub cycles: Vec<Vec<BuildLabel>>,
}

pub(super) fn collect<'a>(map: &'a RuleEntryMap, roots: &[&'a RuleEntry]) -> Reachable<'a> {
    let mut walker = Walker::new(map);
    for root in roots {
        walker.visit(root);
    }
    walker.result
}

struct Walker<'a> {
    map: &'a RuleEntryMap,
    path: Vec<BuildLabel>,
    marks: HashMap<BuildLabel, Mark>,
    result: Reachable<'a>,
}

impl<'a> Walker<'a> {
    fn new(map: &'a RuleEntryMap) -> Self {
        Self {
            map,
            path: Vec::new(),
            marks: HashMap::new(),
            result: Reachable::default(),
        }
    }

    fn visit(&mut self, entry: &'a RuleEntry) {
        let node = &entry.label;
        let map = self.map;
        match self.marks.get(node) {
            Some(Mark::Expanded) => return,
            Some(Mark::OnPath) => {
                self.record_cycle(node);
                return;
            }
            None => {
                self.marks.insert(node.clone(), Mark::OnPath);
            }
        }
        self.result.entries.push(entry);
        self.path.push(node.clone());

        // Weak dependencies aggregate only; they never contribute sources.
        for dep in &entry.dependencies {
            match map.get(dep) {
                Some(child) => self.visit(child),
                None => {
                    tracing::debug!(missing = %dep, dependent = %node, "dependency missing from rule map");
                    self.result
                        .missing_dependencies
                        .push((node.clone(), dep.clone()));
                }
            }
        }

        self.path.pop();
        self.marks.insert(node.clone(), Mark::Expanded);
    }

    /// `node` was reached again while still on the path; the path from its
    /// first occurrence is the loop.
    fn record_cycle(&mut self, node: &BuildLabel) {
        let ring: Vec<BuildLabel> = self
            .path
            .iter()
            .skip_while(|label| *label != node)
            .cloned()
            .collect();
        debug_assert!(!ring.is_empty(), "a rule on the path must be in it");
        self.result.cycles.push(close_ring(&ring));
    }
}

/// Turn the rules of one loop into the reported cycle.
///
/// The loop starts at its smallest label and ends by repeating it, so the
/// same loop reached from different roots, or entered at a different rule,
/// is reported identically.
fn close_ring(ring: &[BuildLabel]) -> Vec<BuildLabel> {
    let start = ring
        .iter()
        .enumerate()
        .min_by_key(|&(_, label)| label)
        .map_or(0, |(idx, _)| idx);
    let mut cycle: Vec<BuildLabel> = ring
        .iter()
        .skip(start)
        .chain(ring.iter().take(start))
        .cloned()
        .collect();
    if let Some(first) = cycle.first().cloned() {
        cycle.push(first);
    }
    cycle
}

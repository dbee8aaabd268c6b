//! Stable object identifiers.

use std::collections::HashMap;

use crate::hasher::NameHasher;
use crate::project::ObjectId;

/// Hex digits of the per-project salt.
const SALT_DIGITS: usize = 8;

/// Assigns 24-digit hexadecimal identifiers in visiting order.
///
/// An identifier is the project-name salt followed by a 16-digit counter, so
/// two graphs visited in the same order receive the same identifiers. Use one
/// generator per generation run.
#[derive(Debug, Clone)]
pub struct GidGenerator {
    salt: String,
    next: u64,
    assigned: HashMap<ObjectId, String>,
}

impl GidGenerator {
    /// Create a generator salted by the project name.
    #[must_use]
    pub fn new(project_name: &str) -> Self {
        Self {
            salt: NameHasher::digest([project_name], SALT_DIGITS).to_uppercase(),
            next: 0,
            assigned: HashMap::new(),
        }
    }

    /// Identifier for `id`, assigned on the first call.
    ///
    /// The second element is `true` when this call made the assignment.
    pub fn visit(&mut self, id: ObjectId) -> (String, bool) {
        if let Some(gid) = self.assigned.get(&id) {
            return (gid.clone(), false);
        }
        let gid = format!("{}{:016X}", self.salt, self.next);
        self.next += 1;
        self.assigned.insert(id, gid.clone());
        (gid, true)
    }

    /// Identifier already assigned to `id`.
    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&str> {
        self.assigned.get(&id).map(String::as_str)
    }

    /// Number of identifiers handed out.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    /// Whether nothing has been visited yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::ProjectGraph;
    use rstest::rstest;

    #[rstest]
    fn repeated_visits_return_the_same_identifier() {
        let graph = ProjectGraph::new("Demo", "");
        let mut gids = GidGenerator::new("Demo");
        let (first, fresh) = gids.visit(graph.root());
        let (again, fresh_again) = gids.visit(graph.root());
        assert_eq!(first, again);
        assert!(fresh);
        assert!(!fresh_again);
        assert_eq!(first, "D0DF69C00000000000000000");
    }

    #[rstest]
    fn identifiers_follow_visit_order() {
        let graph = ProjectGraph::new("Demo", "");
        let mut gids = GidGenerator::new("Demo");
        let (_, _) = gids.visit(graph.main_group());
        let (root, _) = gids.visit(graph.root());
        assert!(root.ends_with("0000000000000001"));
        assert_eq!(root.len(), 24);
    }
}

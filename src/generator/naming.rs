//! Target naming and collision resolution.

use std::collections::{BTreeMap, HashMap};

use crate::hasher::NameHasher;
use crate::label::BuildLabel;

/// Name of a rule before collisions are considered.
///
/// Labels without a target name fall back to the label text with every
/// character outside `[A-Za-z0-9_.-]` replaced.
#[must_use]
pub fn base_name(label: &BuildLabel) -> String {
    if let Some(name) = label.target_name() {
        return name.to_owned();
    }
    let sanitized: String = label
        .as_str()
        .trim_start_matches('/')
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "_".to_owned()
    } else {
        sanitized
    }
}

/// Hex digits of the suffix that separates names still colliding after
/// qualification.
const QUALIFIED_SUFFIX_DIGITS: usize = 8;

/// Unique target names for `labels`.
///
/// Every label sharing a base name with another is renamed to its
/// package-dash form, e.g. `ios-app-App`. Names that still clash after that,
/// with each other or with an untouched base name, gain a hash of the label
/// text. The result depends only on the set of labels.
#[must_use]
pub fn target_names<'a, I>(labels: I) -> BTreeMap<BuildLabel, String>
where
    I: IntoIterator<Item = &'a BuildLabel>,
{
    let bases: BTreeMap<BuildLabel, String> = labels
        .into_iter()
        .map(|label| (label.clone(), base_name(label)))
        .collect();
    let base_counts = occurrences(bases.values());
    let qualified: BTreeMap<BuildLabel, String> = bases
        .iter()
        .map(|(label, base)| {
            let name = if base_counts.get(base.as_str()).copied().unwrap_or_default() > 1 {
                let renamed = label.package_dash_name().unwrap_or_else(|| base.clone());
                tracing::debug!(%label, from = %base, to = %renamed, "renamed colliding target");
                renamed
            } else {
                base.clone()
            };
            (label.clone(), name)
        })
        .collect();
    let qualified_counts = occurrences(qualified.values());
    qualified
        .iter()
        .map(|(label, name)| {
            let unique = if qualified_counts.get(name.as_str()).copied().unwrap_or_default() > 1 {
                let suffix = NameHasher::digest([label.as_str()], QUALIFIED_SUFFIX_DIGITS);
                tracing::debug!(%label, name = %name, %suffix, "qualified name still collides");
                format!("{name}-{suffix}")
            } else {
                name.clone()
            };
            (label.clone(), unique)
        })
        .collect()
}

fn occurrences<'a>(names: impl Iterator<Item = &'a String>) -> HashMap<&'a str, usize> {
    let mut counts = HashMap::new();
    for name in names {
        *counts.entry(name.as_str()).or_default() += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    fn label(text: &str) -> BuildLabel {
        BuildLabel::parse(text).expect("valid label")
    }

    #[rstest]
    fn colliding_names_are_both_renamed() {
        let (ios, mac, lib) = (label("//ios/app:App"), label("//mac/app:App"), label("//lib:Lib"));
        let names = target_names([&ios, &mac, &lib]);
        assert_eq!(names.get(&ios).map(String::as_str), Some("ios-app-App"));
        assert_eq!(names.get(&mac).map(String::as_str), Some("mac-app-App"));
        assert_eq!(names.get(&lib).map(String::as_str), Some("Lib"));
    }

    #[rstest]
    fn naming_ignores_input_order() {
        let forward = [label("//a:X"), label("//b:X")];
        let backward = [label("//b:X"), label("//a:X")];
        assert_eq!(target_names(&forward), target_names(&backward));
    }

    #[rstest]
    fn qualified_names_never_collide() {
        let labels = ["//a:X", "//b:X", "//c:a-X", "//a-b:Y", "//a_b:Y", "//a/b:Y"].map(label);
        let names = target_names(&labels);
        let unique: HashSet<&String> = names.values().collect();
        assert_eq!(unique.len(), labels.len(), "{names:?}");
        assert_eq!(names.get(&label("//b:X")).map(String::as_str), Some("b-X"));
        assert_eq!(names.get(&label("//a_b:Y")).map(String::as_str), Some("a_b-Y"));
        let clashing = names.get(&label("//a:X")).expect("named");
        assert!(clashing.starts_with("a-X-"), "{clashing}");
        assert_eq!(clashing.len(), "a-X-".len() + 8);
        assert_eq!(names, target_names(labels.iter().rev()));
    }

    #[rstest]
    #[case("//", "_")]
    #[case("app/", "app_")]
    fn names_labels_without_target(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(base_name(&label(text)), expected);
    }
}

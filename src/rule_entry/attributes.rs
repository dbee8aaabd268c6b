//! Layered rule attributes.

use std::collections::BTreeMap;

/// A single attribute value as emitted by the extraction stage.
pub type AttributeValue = serde_json::Value;
/// Attribute name to value.
pub type AttributeMap = BTreeMap<String, AttributeValue>;

/// The three attribute layers of a rule, lowest precedence first.
///
/// Each layer is filtered once at construction and never mutated again.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeLayers {
    own: AttributeMap,
    inheritable: AttributeMap,
    transitive: AttributeMap,
}

impl AttributeLayers {
    /// Build the layers, dropping keys whose value is null or empty.
    #[must_use]
    pub fn new(own: &AttributeMap, inheritable: &AttributeMap, transitive: &AttributeMap) -> Self {
        Self {
            own: retain_present(own),
            inheritable: retain_present(inheritable),
            transitive: retain_present(transitive),
        }
    }

    /// Look up a key, honouring layer precedence.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&AttributeValue> {
        self.transitive
            .get(key)
            .or_else(|| self.inheritable.get(key))
            .or_else(|| self.own.get(key))
    }

    /// Overlay the layers into one map.
    #[must_use]
    pub fn merged(&self) -> AttributeMap {
        let mut merged = self.own.clone();
        for layer in [&self.inheritable, &self.transitive] {
            merged.extend(layer.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        merged
    }
}

fn retain_present(layer: &AttributeMap) -> AttributeMap {
    layer
        .iter()
        .filter(|(_, value)| is_present(value))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn is_present(value: &AttributeValue) -> bool {
    match value {
        AttributeValue::Null => false,
        AttributeValue::String(s) => !s.is_empty(),
        AttributeValue::Array(items) => !items.is_empty(),
        AttributeValue::Object(map) => !map.is_empty(),
        AttributeValue::Bool(_) | AttributeValue::Number(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn map(pairs: &[(&str, AttributeValue)]) -> AttributeMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    #[rstest]
    fn higher_layers_win_per_key() {
        let layers = AttributeLayers::new(
            &map(&[("a", json!("own")), ("b", json!("own")), ("c", json!("own"))]),
            &map(&[("b", json!("inherit")), ("c", json!("inherit"))]),
            &map(&[("c", json!("transitive"))]),
        );
        let merged = layers.merged();
        assert_eq!(merged.get("a"), Some(&json!("own")));
        assert_eq!(merged.get("b"), Some(&json!("inherit")));
        assert_eq!(merged.get("c"), Some(&json!("transitive")));
        assert_eq!(layers.lookup("c"), Some(&json!("transitive")));
    }

    #[rstest]
    fn empty_values_do_not_shadow_lower_layers() {
        let layers = AttributeLayers::new(
            &map(&[("defines", json!(["A=1"])), ("empty", json!(""))]),
            &map(&[("defines", json!([]))]),
            &map(&[("defines", AttributeValue::Null), ("flag", json!(false))]),
        );
        let merged = layers.merged();
        assert_eq!(merged.get("defines"), Some(&json!(["A=1"])));
        assert!(!merged.contains_key("empty"));
        assert_eq!(merged.get("flag"), Some(&json!(false)));
    }
}

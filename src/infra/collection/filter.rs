//! Partial-match filters.
//!
//! A filter is a JSON object. A document matches when it contains the filter:
//! objects recurse key by key, arrays match when every filter element is
//! contained in some document element, scalars compare by equality. Dotted
//! keys address nested fields, so `{"profile.city": "Oslo"}` is the same
//! filter as `{"profile": {"city": "Oslo"}}`. This is exactly PostgreSQL's
//! `jsonb @>` operator, which the postgres adapter delegates to.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::Document;
use crate::config::ID_FIELD;

/// Which documents an operation targets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter(Map<String, Value>);

impl Filter {
    /// Empty filter, matches every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Match the document with the given identifier.
    pub fn by_id(id: Uuid) -> Self {
        Self::new().eq(ID_FIELD, id.to_string())
    }

    /// Add an equality condition on `field` (dotted paths allowed).
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Filter with dotted keys expanded into nested objects.
    pub fn to_containment(&self) -> Value {
        let mut root = Map::new();
        for (key, value) in &self.0 {
            let path: Vec<&str> = key.split('.').collect();
            insert_path(&mut root, &path, value.clone());
        }
        Value::Object(root)
    }

    /// Whether `document` satisfies this filter.
    pub fn matches(&self, document: &Document) -> bool {
        match self.to_containment() {
            Value::Object(pattern) => pattern
                .iter()
                .all(|(key, expected)| document.get(key).is_some_and(|v| contains(v, expected))),
            _ => false,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::Object(self.0.clone()))
    }
}

fn insert_path(target: &mut Map<String, Value>, path: &[&str], value: Value) {
    match path {
        [] => {}
        [last] => merge_into(target, last, value),
        [head, rest @ ..] => {
            let slot = target
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(nested) = slot {
                insert_path(nested, rest, value);
            }
        }
    }
}

/// Insert `value` under `key`, deep-merging when both sides are objects.
fn merge_into(target: &mut Map<String, Value>, key: &str, value: Value) {
    if let Value::Object(incoming) = value {
        if let Some(Value::Object(existing)) = target.get_mut(key) {
            for (k, v) in incoming {
                merge_into(existing, &k, v);
            }
            return;
        }
        target.insert(key.to_string(), Value::Object(incoming));
    } else {
        target.insert(key.to_string(), value);
    }
}

/// jsonb containment: does `haystack` contain `needle`?
fn contains(haystack: &Value, needle: &Value) -> bool {
    match (haystack, needle) {
        (Value::Object(h), Value::Object(n)) => n
            .iter()
            .all(|(key, nv)| h.get(key).is_some_and(|hv| contains(hv, nv))),
        (Value::Array(h), Value::Array(n)) => {
            n.iter().all(|nv| h.iter().any(|hv| contains(hv, nv)))
        }
        (h, n) => h == n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("test document must be an object"),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::new().matches(&doc(json!({"name": "a"}))));
        assert!(Filter::new().matches(&Document::new()));
    }

    #[test]
    fn equality_on_top_level_fields() {
        let document = doc(json!({"name": "a", "age": 3}));

        assert!(Filter::new().eq("name", "a").matches(&document));
        assert!(Filter::new().eq("name", "a").eq("age", 3).matches(&document));
        assert!(!Filter::new().eq("name", "b").matches(&document));
        assert!(!Filter::new().eq("missing", "a").matches(&document));
    }

    #[test]
    fn dotted_keys_reach_nested_fields() {
        let document = doc(json!({"profile": {"city": "Oslo", "zip": "0150"}}));

        assert!(Filter::new().eq("profile.city", "Oslo").matches(&document));
        assert!(!Filter::new().eq("profile.city", "Bergen").matches(&document));
        assert_eq!(
            Filter::new()
                .eq("profile.city", "Oslo")
                .eq("profile.zip", "0150")
                .to_containment(),
            json!({"profile": {"city": "Oslo", "zip": "0150"}})
        );
    }

    #[test]
    fn arrays_match_by_containment() {
        let document = doc(json!({"tags": ["rust", "db", "web"]}));

        assert!(Filter::new().eq("tags", json!(["db"])).matches(&document));
        assert!(Filter::new().eq("tags", json!(["web", "rust"])).matches(&document));
        assert!(!Filter::new().eq("tags", json!(["go"])).matches(&document));
    }

    #[test]
    fn by_id_targets_identifier_key() {
        let id = Uuid::new_v4();
        let document = doc(json!({"_id": id.to_string(), "name": "a"}));

        assert!(Filter::by_id(id).matches(&document));
        assert!(!Filter::by_id(Uuid::new_v4()).matches(&document));
    }

    #[test]
    fn display_renders_json() {
        let filter = Filter::new().eq("name", "a");
        assert_eq!(filter.to_string(), r#"{"name":"a"}"#);
    }
}

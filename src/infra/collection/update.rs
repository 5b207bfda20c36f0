//! Partial updates applied to a stored document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Document;
use crate::config::ID_FIELD;
use crate::errors::{AppError, AppResult};

/// Field changes for `find_one_and_update`.
///
/// Serializes in the familiar operator form
/// `{"$set": {...}, "$unset": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Update {
    #[serde(rename = "$set", default, skip_serializing_if = "Map::is_empty")]
    set: Map<String, Value>,
    #[serde(rename = "$unset", default, skip_serializing_if = "Vec::is_empty")]
    unset: Vec<String>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `field` (dotted paths allowed) to `value`.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.insert(field.into(), value.into());
        self
    }

    /// Remove `field` (dotted paths allowed). Missing fields are ignored.
    pub fn unset(mut self, field: impl Into<String>) -> Self {
        self.unset.push(field.into());
        self
    }

    /// Turn a partial struct into a `$set` of every field it serializes.
    ///
    /// Fields skipped by serde (e.g. `skip_serializing_if = "Option::is_none"`)
    /// are left untouched; fields serialized as `null` are set to `null`.
    pub fn from_partial<T: Serialize>(partial: &T) -> AppResult<Self> {
        match serde_json::to_value(partial)? {
            Value::Object(set) => Ok(Self {
                set,
                unset: Vec::new(),
            }),
            other => Err(AppError::bad_request(format!(
                "update must be a JSON object, got {}",
                other
            ))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty()
    }

    /// Apply the changes to `document` in place: `$set` first, then `$unset`.
    ///
    /// # Errors
    /// `BadRequest` when the update touches the identifier or tries to
    /// descend into a field that is not an object. The document may be
    /// partially modified in that case, so callers apply to a copy.
    pub fn apply(&self, document: &mut Document) -> AppResult<()> {
        for field in self.set.keys().chain(self.unset.iter()) {
            if field == ID_FIELD || field.starts_with(&format!("{}.", ID_FIELD)) {
                return Err(AppError::bad_request(format!(
                    "field '{}' is immutable",
                    ID_FIELD
                )));
            }
        }

        for (field, value) in &self.set {
            set_path(document, field, value.clone())?;
        }
        for field in &self.unset {
            unset_path(document, field);
        }
        Ok(())
    }
}

fn set_path(document: &mut Document, field: &str, value: Value) -> AppResult<()> {
    let mut segments = field.split('.').collect::<Vec<_>>();
    let last = segments.pop().unwrap_or(field);

    let mut target = document;
    for segment in segments {
        let slot = target
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        target = match slot {
            Value::Object(map) => map,
            _ => {
                return Err(AppError::bad_request(format!(
                    "cannot set '{}': '{}' is not an object",
                    field, segment
                )))
            }
        };
    }

    target.insert(last.to_string(), value);
    Ok(())
}

fn unset_path(document: &mut Document, field: &str) {
    let mut segments = field.split('.').collect::<Vec<_>>();
    let last = segments.pop().unwrap_or(field);

    let mut target = document;
    for segment in segments {
        match target.get_mut(segment) {
            Some(Value::Object(map)) => target = map,
            _ => return,
        }
    }
    target.remove(last);
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
    fn set_changes_only_named_fields() {
        let mut document = doc(json!({"_id": "1", "name": "a", "age": 3}));

        Update::new().set("name", "b").apply(&mut document).unwrap();

        assert_eq!(
            Value::Object(document),
            json!({"_id": "1", "name": "b", "age": 3})
        );
    }

    #[test]
    fn dotted_set_creates_intermediate_objects() {
        let mut document = doc(json!({"_id": "1"}));

        Update::new()
            .set("profile.city", "Oslo")
            .apply(&mut document)
            .unwrap();

        assert_eq!(document["profile"], json!({"city": "Oslo"}));
    }

    #[test]
    fn dotted_set_through_scalar_fails() {
        let mut document = doc(json!({"_id": "1", "profile": "none"}));

        let result = Update::new().set("profile.city", "Oslo").apply(&mut document);

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn unset_removes_fields_and_ignores_missing() {
        let mut document = doc(json!({"_id": "1", "name": "a", "profile": {"city": "Oslo"}}));

        Update::new()
            .unset("name")
            .unset("profile.city")
            .unset("nothing.here")
            .apply(&mut document)
            .unwrap();

        assert_eq!(Value::Object(document), json!({"_id": "1", "profile": {}}));
    }

    #[test]
    fn identifier_is_immutable() {
        let mut document = doc(json!({"_id": "1"}));

        assert!(Update::new().set("_id", "2").apply(&mut document).is_err());
        assert!(Update::new().unset("_id").apply(&mut document).is_err());
        assert_eq!(document["_id"], "1");
    }

    #[test]
    fn from_partial_skips_omitted_fields() {
        #[derive(Serialize)]
        struct Partial {
            name: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            email: Option<String>,
        }

        let update = Update::from_partial(&Partial {
            name: Some("b".to_string()),
            email: None,
        })
        .unwrap();

        assert_eq!(update, Update::new().set("name", "b"));
        assert!(Update::from_partial(&"scalar").is_err());
    }

    #[test]
    fn serializes_in_operator_form() {
        let update = Update::new().set("name", "b").unset("age");

        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"$set": {"name": "b"}, "$unset": ["age"]})
        );
        assert!(Update::new().is_empty());
    }
}

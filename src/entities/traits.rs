//! Shared entity traits: identity and tree (de)serialization.
//!
//! Containers at every level (collection, animation, frame) work with
//! children through these, so lookup and reordering rules live in one place.

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::TreeError;

/// Entity with a stable, process-unique identifier.
pub trait Identified {
    fn id(&self) -> Uuid;
}

/// Explicit per-type conversion to/from the generic key-value tree.
pub trait TreeNode: Sized {
    fn to_tree(&self) -> Value;
    fn from_tree(tree: &Value) -> Result<Self, TreeError>;
}

/// Linear scan by id. Child lists stay short (tens of items).
pub(crate) fn position_by_id<T: Identified>(items: &[T], id: Uuid) -> Option<usize> {
    items.iter().position(|item| item.id() == id)
}

/// Stable single-element relocation: every other item keeps its relative order.
pub(crate) fn relocate<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() || to >= items.len() {
        return false;
    }
    if from != to {
        let item = items.remove(from);
        items.insert(to, item);
    }
    true
}

/// Parse an id from its canonical string form.
pub fn parse_id(s: &str) -> Result<Uuid, TreeError> {
    Uuid::parse_str(s).map_err(|_| TreeError::InvalidId(s.to_string()))
}

/// Typed field reader over one tree node. Missing fields fall back to the
/// caller's default; present fields of the wrong type are errors.
pub(crate) struct Fields<'a> {
    map: &'a Map<String, Value>,
    entity: &'static str,
}

impl<'a> Fields<'a> {
    pub fn new(tree: &'a Value, entity: &'static str) -> Result<Self, TreeError> {
        tree.as_object()
            .map(|map| Self { map, entity })
            .ok_or(TreeError::NotAnObject { entity })
    }

    fn invalid(&self, field: &'static str, expected: &'static str) -> TreeError {
        TreeError::InvalidField {
            entity: self.entity,
            field,
            expected,
        }
    }

    /// Stored id, or a fresh one when absent.
    pub fn id(&self, key: &'static str) -> Result<Uuid, TreeError> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(Uuid::new_v4()),
            Some(Value::String(s)) => parse_id(s),
            Some(_) => Err(self.invalid(key, "id string")),
        }
    }

    pub fn str_or(&self, key: &'static str, default: &str) -> Result<String, TreeError> {
        match self.map.get(key) {
            None => Ok(default.to_string()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(self.invalid(key, "string")),
        }
    }

    pub fn i32_or(&self, key: &'static str, default: i32) -> Result<i32, TreeError> {
        match self.map.get(key) {
            None => Ok(default),
            Some(v) => v
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .ok_or_else(|| self.invalid(key, "32-bit integer")),
        }
    }

    pub fn u32_or(&self, key: &'static str, default: u32) -> Result<u32, TreeError> {
        match self.map.get(key) {
            None => Ok(default),
            Some(v) => v
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| self.invalid(key, "unsigned integer")),
        }
    }

    pub fn f32_or(&self, key: &'static str, default: f32) -> Result<f32, TreeError> {
        match self.map.get(key) {
            None => Ok(default),
            Some(v) => v
                .as_f64()
                .map(|n| n as f32)
                .ok_or_else(|| self.invalid(key, "number")),
        }
    }

    pub fn bool_or(&self, key: &'static str, default: bool) -> Result<bool, TreeError> {
        match self.map.get(key) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(_) => Err(self.invalid(key, "boolean")),
        }
    }

    /// Array field; missing means empty.
    pub fn array(&self, key: &'static str) -> Result<&'a [Value], TreeError> {
        match self.map.get(key) {
            None => Ok(&[]),
            Some(Value::Array(items)) => Ok(items.as_slice()),
            Some(_) => Err(self.invalid(key, "array")),
        }
    }

    /// Object field; missing means empty.
    pub fn object(&self, key: &'static str) -> Result<Option<&'a Map<String, Value>>, TreeError> {
        match self.map.get(key) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(_) => Err(self.invalid(key, "object")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_relocate_is_stable() {
        let mut v = vec!['a', 'b', 'c', 'd', 'e'];
        assert!(relocate(&mut v, 0, 3));
        assert_eq!(v, vec!['b', 'c', 'd', 'a', 'e']);
        assert!(relocate(&mut v, 4, 1));
        assert_eq!(v, vec!['b', 'e', 'c', 'd', 'a']);
        assert!(!relocate(&mut v, 5, 0));
        assert!(!relocate(&mut v, 0, 5));
    }

    #[test]
    fn test_fields_defaults_and_type_errors() {
        let tree = json!({"x": 5, "name": "HEAD", "flag": "yes", "big": 1u64 << 40});
        let f = Fields::new(&tree, "sprite").unwrap();
        assert_eq!(f.i32_or("x", 0).unwrap(), 5);
        assert_eq!(f.i32_or("missing", -3).unwrap(), -3);
        assert_eq!(f.str_or("name", "").unwrap(), "HEAD");
        assert!(matches!(
            f.bool_or("flag", false),
            Err(TreeError::InvalidField { field: "flag", .. })
        ));
        assert!(f.i32_or("big", 0).is_err());
        assert!(f.array("missing").unwrap().is_empty());
    }

    #[test]
    fn test_fields_rejects_non_object() {
        assert!(matches!(
            Fields::new(&json!([1, 2]), "frame"),
            Err(TreeError::NotAnObject { entity: "frame" })
        ));
    }

    #[test]
    fn test_id_parse() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
        assert!(matches!(parse_id("nope"), Err(TreeError::InvalidId(_))));
    }
}

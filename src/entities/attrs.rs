//! Generic attribute view used by inspector-style editors.
//!
//! Entities keep typed fields; `Attrs` is the key/value projection handed to
//! UI panels that edit "any property" without knowing the entity type.
//! Keys keep insertion order so panels list fields in declaration order.

use indexmap::IndexMap;

/// Generic attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Bool(bool),
    Str(String),
    Int(i32),
    UInt(u32),
    Float(f32),
}

impl AttrValue {
    /// Short type name for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            AttrValue::Bool(_) => "bool",
            AttrValue::Str(_) => "string",
            AttrValue::Int(_) => "int",
            AttrValue::UInt(_) => "uint",
            AttrValue::Float(_) => "float",
        }
    }
}

/// Attribute container: string key -> typed value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attrs {
    map: IndexMap<String, AttrValue>,
}

impl Attrs {
    pub fn new() -> Self {
        Self {
            map: IndexMap::new(),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: AttrValue) {
        self.map.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.map.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.map.get(key) {
            Some(AttrValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn get_i32(&self, key: &str) -> Option<i32> {
        match self.map.get(key) {
            Some(AttrValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_u32(&self, key: &str) -> Option<u32> {
        match self.map.get(key) {
            Some(AttrValue::UInt(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_float(&self, key: &str) -> Option<f32> {
        match self.map.get(key) {
            Some(AttrValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.map.get(key) {
            Some(AttrValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    /// Remove attribute by key
    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        self.map.shift_remove(key)
    }

    /// Iterate over all attributes (key, value) in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttrValue)> {
        self.map.iter()
    }

    /// Check if attribute exists
    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters() {
        let mut attrs = Attrs::new();
        attrs.set("name", AttrValue::Str("HEAD_1".into()));
        attrs.set("x", AttrValue::Int(-4));
        attrs.set("opacity", AttrValue::Float(0.5));

        assert_eq!(attrs.get_str("name"), Some("HEAD_1"));
        assert_eq!(attrs.get_i32("x"), Some(-4));
        // Wrong type is a miss, not a coercion
        assert_eq!(attrs.get_u32("x"), None);
        assert_eq!(attrs.get_float("opacity"), Some(0.5));
        assert_eq!(attrs.get_bool("visible"), None);
    }

    #[test]
    fn test_insertion_order_kept() {
        let mut attrs = Attrs::new();
        attrs.set("b", AttrValue::Bool(true));
        attrs.set("a", AttrValue::Bool(false));
        attrs.set("c", AttrValue::UInt(3));
        attrs.remove("a");

        let keys: Vec<&str> = attrs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "c"]);
        assert_eq!(attrs.len(), 2);
        assert!(!attrs.contains("a"));
    }
}

//! Configuration tree
//!
//! An optional-valued tree mirroring a `ResourceSchema`. A field is absent
//! when its key is missing from the enclosing `Object`; there is no null
//! value. Key order is insertion order.

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

/// Root of a resource configuration
pub type ConfigurationTree = Object;

/// A present configuration value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Number(f64),
    Bool(bool),
    List(Vec<Value>),
    Map(IndexMap<String, String>),
    Object(Object),
}

impl Value {
    /// Type name used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Number(_) => "number",
            Self::Bool(_) => "boolean",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Object(_) => "object",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric view of integers and numbers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Number of list items or map entries
    pub fn item_count(&self) -> Option<usize> {
        match self {
            Self::List(items) => Some(items.len()),
            Self::Map(map) => Some(map.len()),
            _ => None,
        }
    }

    /// An object whose every child is absent counts as absent itself
    pub fn is_absent(&self) -> bool {
        match self {
            Self::Object(o) => !o.has_present(),
            _ => false,
        }
    }

    /// Convert to JSON (used for state output and diagnostics)
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::String(s) => JsonValue::String(s.clone()),
            Self::Integer(n) => JsonValue::from(*n),
            Self::Number(n) => JsonValue::from(*n),
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::List(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
            Self::Map(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
                    .collect(),
            ),
            Self::Object(o) => o.to_json(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Integer(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Self::Object(o)
    }
}

impl From<IndexMap<String, String>> for Value {
    fn from(map: IndexMap<String, String>) -> Self {
        Self::Map(map)
    }
}

/// Ordered set of present fields keyed by internal name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Object(IndexMap<String, Value>);

impl Object {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Get a value by dotted path (e.g. `metadata.name`)
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether any child is present (recursively through nested objects)
    pub fn has_present(&self) -> bool {
        self.0.values().any(|v| !v.is_absent())
    }

    /// Drop nested objects with no present children
    ///
    /// This is the canonical form: decoding and manifest parsing always
    /// produce pruned trees. Objects inside lists are kept so list length is
    /// preserved.
    pub fn pruned(&self) -> Object {
        let mut out = Object::new();
        for (name, value) in &self.0 {
            if value.is_absent() {
                continue;
            }
            out.0.insert(name.clone(), prune_value(value));
        }
        out
    }

    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

fn prune_value(value: &Value) -> Value {
    match value {
        Value::Object(o) => Value::Object(o.pruned()),
        Value::List(items) => Value::List(items.iter().map(prune_value).collect()),
        other => other.clone(),
    }
}

impl FromIterator<(String, Value)> for Object {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_path() {
        let tree = Object::new()
            .with("metadata", Object::new().with("name", "demo"))
            .with("spec", Object::new().with("core_limit", 2));

        assert_eq!(tree.get_path("metadata.name"), Some(&Value::from("demo")));
        assert_eq!(tree.get_path("spec.core_limit").and_then(Value::as_i64), Some(2));
        assert!(tree.get_path("metadata.namespace").is_none());
        assert!(tree.get_path("metadata.name.deeper").is_none());
    }

    #[test]
    fn test_empty_objects_are_absent() {
        let tree = Object::new()
            .with("metadata", Object::new().with("name", "demo"))
            .with("spec", Object::new().with("nested", Object::new()));

        assert!(Value::Object(Object::new()).is_absent());
        assert!(tree.get("spec").unwrap().is_absent());
        assert!(tree.has_present());

        let pruned = tree.pruned();
        assert!(pruned.contains("metadata"));
        assert!(!pruned.contains("spec"));
    }

    #[test]
    fn test_pruned_keeps_list_entries() {
        let tree = Object::new().with(
            "items",
            vec![Value::Object(Object::new()), Value::Object(Object::new().with("a", 1))],
        );
        let pruned = tree.pruned();
        assert_eq!(pruned.get("items").and_then(Value::as_list).map(<[Value]>::len), Some(2));
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let tree = Object::new().with("b", 1).with("a", 2).with("c", 3);
        let keys: Vec<&str> = tree.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_to_json() {
        let mut labels = IndexMap::new();
        labels.insert("app".to_string(), "demo".to_string());
        let tree = Object::new()
            .with("name", "demo")
            .with("labels", labels)
            .with("ratio", 0.5);

        assert_eq!(
            tree.to_json(),
            serde_json::json!({"name": "demo", "labels": {"app": "demo"}, "ratio": 0.5})
        );
    }
}

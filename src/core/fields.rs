//! Structured fields for context and metadata
//!
//! This module provides:
//! - `FieldValue`: a plain JSON value or a deferred [`Lazy`] value
//! - `Fields`: an ordered key-value map of `FieldValue`s

use super::lazy::Lazy;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use std::collections::btree_map::{self, BTreeMap};
use std::fmt;

/// Value type for structured logging fields
#[derive(Debug, Clone)]
pub enum FieldValue {
    Value(Value),
    Lazy(Lazy),
}

impl FieldValue {
    pub fn is_lazy(&self) -> bool {
        matches!(self, FieldValue::Lazy(_))
    }

    /// The plain value, if this is not a lazy wrapper
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            FieldValue::Value(v) => Some(v),
            FieldValue::Lazy(_) => None,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Value(v) => v.serialize(serializer),
            // Unresolved wrappers never leak into output
            FieldValue::Lazy(_) => serializer.serialize_none(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Value(Value::String(s)) => write!(f, "{}", s),
            FieldValue::Value(v) => write!(f, "{}", v),
            FieldValue::Lazy(l) => write!(f, "{:?}", l),
        }
    }
}

impl From<Lazy> for FieldValue {
    fn from(lazy: Lazy) -> Self {
        FieldValue::Lazy(lazy)
    }
}

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        FieldValue::Value(v)
    }
}

macro_rules! field_value_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(v: $ty) -> Self {
                    FieldValue::Value(Value::from(v))
                }
            }
        )*
    };
}

field_value_from!(String, &str, i64, i32, u64, u32, f64, bool, Vec<Value>);

/// Ordered map of structured fields
///
/// Used both for persistent logger context and per-call metadata.
/// A JSON object converts directly:
///
/// ```
/// use rust_log_layer::Fields;
/// use serde_json::json;
///
/// let fields = Fields::from(json!({"user_id": 42, "region": "eu"}));
/// assert_eq!(fields.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Fields {
    fields: BTreeMap<String, FieldValue>,
}

impl Fields {
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Add a field (builder style)
    #[must_use]
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn insert<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.fields.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, FieldValue> {
        self.fields.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    /// Right-biased shallow merge: `other` wins on key collision
    pub fn merge(&mut self, other: Fields) {
        self.fields.extend(other.fields);
    }

    pub fn has_lazy(&self) -> bool {
        self.fields.values().any(FieldValue::is_lazy)
    }

    pub fn has_async_lazy(&self) -> bool {
        self.fields
            .values()
            .any(|v| matches!(v, FieldValue::Lazy(l) if l.is_async()))
    }

    /// Plain values only; lazy wrappers are skipped
    pub fn to_map_lossy(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .filter_map(|(k, v)| v.as_value().map(|v| (k.clone(), v.clone())))
            .collect()
    }
}

impl Serialize for Fields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl From<Map<String, Value>> for Fields {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            fields: map
                .into_iter()
                .map(|(k, v)| (k, FieldValue::Value(v)))
                .collect(),
        }
    }
}

/// Objects become fields; any other JSON value yields an empty map
impl From<Value> for Fields {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Fields::from(map),
            _ => Fields::new(),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for Fields
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Fields {
    type Item = (String, FieldValue);
    type IntoIter = btree_map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = (&'a String, &'a FieldValue);
    type IntoIter = btree_map::Iter<'a, String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lazy::lazy;
    use serde_json::json;

    #[test]
    fn test_fields_with_values() {
        let fields = Fields::new()
            .with_field("user_id", 123)
            .with_field("username", "john_doe")
            .with_field("active", true);

        assert_eq!(fields.len(), 3);
        assert!(!fields.has_lazy());
    }

    #[test]
    fn test_merge_is_right_biased() {
        let mut base = Fields::from(json!({"a": 1, "b": 1}));
        base.merge(Fields::from(json!({"b": 2, "c": 3})));

        assert_eq!(base.to_map_lossy(), json!({"a": 1, "b": 2, "c": 3}).as_object().unwrap().clone());
    }

    #[test]
    fn test_non_object_value_is_empty() {
        assert!(Fields::from(json!([1, 2, 3])).is_empty());
        assert!(Fields::from(Value::Null).is_empty());
    }

    #[test]
    fn test_lazy_serializes_as_null() {
        let fields = Fields::new()
            .with_field("plain", "x")
            .with_field("deferred", lazy(|| 1));

        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json, json!({"plain": "x", "deferred": null}));
    }

    #[test]
    fn test_from_iterator() {
        let fields: Fields = vec![("a", 1), ("b", 2)].into_iter().collect();
        assert!(fields.contains_key("a"));
        assert!(fields.contains_key("b"));
    }
}

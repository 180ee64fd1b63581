//! Attribute values attached to every emitted signal.
//!
//! `MutableAttributes` is a shared handle: clones point at the same map, so an
//! attribute set after a configuration was built is still visible through it.

use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    Array(Vec<AttributeValue>),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Name of the value type, as reported in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::Array(_) => "array",
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Double(value) => write!(f, "{value}"),
            Self::String(value) => f.write_str(value),
            Self::Array(values) => {
                f.write_str("[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

/// Shared, lock-protected attribute map.
#[derive(Clone, Default)]
pub struct MutableAttributes {
    inner: Arc<RwLock<BTreeMap<String, AttributeValue>>>,
}

impl MutableAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: BTreeMap<String, AttributeValue>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    pub fn get(&self, key: &str) -> Option<AttributeValue> {
        self.inner.read().get(key).cloned()
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        match self.inner.read().get(key) {
            Some(AttributeValue::String(value)) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.inner.read().get(key) {
            Some(AttributeValue::Bool(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.inner.read().get(key) {
            Some(AttributeValue::Int(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn get_double(&self, key: &str) -> Option<f64> {
        match self.inner.read().get(key) {
            Some(AttributeValue::Double(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn get_array(&self, key: &str) -> Option<Vec<AttributeValue>> {
        match self.inner.read().get(key) {
            Some(AttributeValue::Array(values)) => Some(values.clone()),
            _ => None,
        }
    }

    /// Insert or replace a value, returning the previous one.
    pub fn set(&self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Option<AttributeValue> {
        self.inner.write().insert(key.into(), value.into())
    }

    pub fn set_string(&self, key: impl Into<String>, value: impl Into<String>) {
        self.set(key, AttributeValue::String(value.into()));
    }

    pub fn set_bool(&self, key: impl Into<String>, value: bool) {
        self.set(key, AttributeValue::Bool(value));
    }

    pub fn set_int(&self, key: impl Into<String>, value: i64) {
        self.set(key, AttributeValue::Int(value));
    }

    pub fn set_double(&self, key: impl Into<String>, value: f64) {
        self.set(key, AttributeValue::Double(value));
    }

    pub fn set_array(&self, key: impl Into<String>, values: Vec<AttributeValue>) {
        self.set(key, AttributeValue::Array(values));
    }

    pub fn remove(&self, key: &str) -> Option<AttributeValue> {
        self.inner.write().remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Copy every entry of `other` into this map, replacing existing keys.
    pub fn extend_from(&self, other: &MutableAttributes) {
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return;
        }
        let entries = other.snapshot();
        self.inner.write().extend(entries);
    }

    /// Point-in-time copy of all entries.
    pub fn snapshot(&self) -> BTreeMap<String, AttributeValue> {
        self.inner.read().clone()
    }

    /// A handle with its own copy of the entries, detached from `self`.
    pub fn deep_copy(&self) -> Self {
        Self::from_map(self.snapshot())
    }
}

impl PartialEq for MutableAttributes {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return true;
        }
        *self.inner.read() == *other.inner.read()
    }
}

impl fmt::Debug for MutableAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.inner.read().iter()).finish()
    }
}

impl<K: Into<String>, V: Into<AttributeValue>> FromIterator<(K, V)> for MutableAttributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl Serialize for MutableAttributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.inner.read().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MutableAttributes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        BTreeMap::<String, AttributeValue>::deserialize(deserializer).map(Self::from_map)
    }
}

//! Property mappings and the normalizer.
//!
//! A `PropertyMapping` is the ordered field -> value set that every filter,
//! value list and relationship property set is expressed in. Key order is the
//! insertion order and is preserved all the way into the generated Cypher, so
//! compiled statements are deterministic.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Field holding the storage engine's internal node identifier.
pub const ID_FIELD: &str = "id";

/// A scalar or date value of a single record field.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Date(DateTime<Utc>),
}

impl PropertyValue {
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    /// JSON form used in request bindings. Dates become RFC 3339 strings with
    /// millisecond precision.
    pub fn to_json(&self) -> Value {
        match self {
            PropertyValue::Null => Value::Null,
            PropertyValue::Bool(b) => Value::Bool(*b),
            PropertyValue::Integer(i) => Value::from(*i),
            PropertyValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            PropertyValue::Text(s) => Value::String(s.clone()),
            PropertyValue::Date(d) => {
                Value::String(d.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
        }
    }

    /// Converts a JSON value into a property value. Arrays and objects are not
    /// scalar and yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(PropertyValue::Null),
            Value::Bool(b) => Some(PropertyValue::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(PropertyValue::Integer(i)),
                None => n.as_f64().map(PropertyValue::Float),
            },
            Value::String(s) => Some(PropertyValue::Text(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Numeric reading of a text value, if the whole (trimmed) string is a number.
    fn parse_numeric(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Some(PropertyValue::Integer(i));
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() => Some(PropertyValue::Float(f)),
            _ => None,
        }
    }
}

impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        PropertyValue::Integer(value as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(value: DateTime<Utc>) -> Self {
        PropertyValue::Date(value)
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(PropertyValue::Null)
    }
}

/// Ordered field -> value mapping with unique keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMapping {
    entries: Vec<(String, PropertyValue)>,
}

impl PropertyMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts a value. An existing key keeps its position and gets the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Builds a mapping from a JSON object, skipping non-scalar members.
    pub fn from_json_object(object: &serde_json::Map<String, Value>) -> Self {
        let mut mapping = Self::new();
        for (key, value) in object {
            match PropertyValue::from_json(value) {
                Some(v) => mapping.insert(key.clone(), v),
                None => log::warn!("Ignoring non-scalar property '{}'", key),
            }
        }
        mapping
    }

    /// JSON object with the same keys, in the same order.
    pub fn to_json_object(&self) -> serde_json::Map<String, Value> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<PropertyValue>> FromIterator<(K, V)> for PropertyMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (k, v) in iter {
            mapping.insert(k, v);
        }
        mapping
    }
}

impl Serialize for PropertyMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json_object().serialize(serializer)
    }
}

/// Drops null fields and turns a numeric-looking `id` string into a number.
///
/// Pure and idempotent.
pub fn normalize(mapping: &PropertyMapping) -> PropertyMapping {
    let mut normalized = PropertyMapping {
        entries: mapping
            .entries
            .iter()
            .filter(|(_, v)| !v.is_null())
            .cloned()
            .collect(),
    };

    if let Some((_, value)) = normalized.entries.iter_mut().find(|(k, _)| k == ID_FIELD) {
        if let PropertyValue::Text(text) = value {
            if let Some(numeric) = PropertyValue::parse_numeric(text) {
                *value = numeric;
            }
        }
    }

    normalized
}

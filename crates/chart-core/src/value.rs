//! # Document Value Model
//!
//! [`DocumentValue`] is the closed variant every dataset and every template
//! default is expressed in. It mirrors the JSON data model but keeps objects
//! in a sorted map, so iteration order (and therefore diagnostic order and
//! serialized output) is deterministic.
//!
//! The compliance engine compares values by [`ValueKind`] only. Two values
//! are *kind-compatible* iff their kinds are equal; literal contents of
//! scalars are never compared.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::ValueError;

/// Object payload of a [`DocumentValue`].
pub type ObjectMap = BTreeMap<String, DocumentValue>;

/// Discriminator of a [`DocumentValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    Object,
    Array,
}

impl ValueKind {
    /// Lowercase name used in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Number => "number",
            Self::String => "string",
            Self::Object => "object",
            Self::Array => "array",
        }
    }

    /// Whether values of this kind can contain nested values.
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Object | Self::Array)
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arbitrary nested document data.
///
/// Serializes exactly like the equivalent `serde_json::Value`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum DocumentValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Object(ObjectMap),
    Array(Vec<DocumentValue>),
}

impl DocumentValue {
    /// An empty object.
    pub fn object() -> Self {
        Self::Object(ObjectMap::new())
    }

    /// Which of the six variants this value holds.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Number(_) => ValueKind::Number,
            Self::String(_) => ValueKind::String,
            Self::Object(_) => ValueKind::Object,
            Self::Array(_) => ValueKind::Array,
        }
    }

    /// Kind compatibility: same variant, regardless of contents.
    pub fn is_kind_compatible(&self, other: &DocumentValue) -> bool {
        self.kind() == other.kind()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    fn mismatch(&self, expected: ValueKind) -> ValueError {
        ValueError::TypeMismatch {
            expected,
            found: self.kind(),
        }
    }

    pub fn as_bool(&self) -> Result<bool, ValueError> {
        match self {
            Self::Bool(b) => Ok(*b),
            other => Err(other.mismatch(ValueKind::Bool)),
        }
    }

    pub fn as_number(&self) -> Result<&Number, ValueError> {
        match self {
            Self::Number(n) => Ok(n),
            other => Err(other.mismatch(ValueKind::Number)),
        }
    }

    pub fn as_str(&self) -> Result<&str, ValueError> {
        match self {
            Self::String(s) => Ok(s),
            other => Err(other.mismatch(ValueKind::String)),
        }
    }

    pub fn as_object(&self) -> Result<&ObjectMap, ValueError> {
        match self {
            Self::Object(map) => Ok(map),
            other => Err(other.mismatch(ValueKind::Object)),
        }
    }

    pub fn as_array(&self) -> Result<&[DocumentValue], ValueError> {
        match self {
            Self::Array(items) => Ok(items),
            other => Err(other.mismatch(ValueKind::Array)),
        }
    }

    /// Look up `key` on an object. Non-objects have no keys.
    pub fn get(&self, key: &str) -> Option<&DocumentValue> {
        match self {
            Self::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Mutable lookup of `key` on an object.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut DocumentValue> {
        match self {
            Self::Object(map) => map.get_mut(key),
            _ => None,
        }
    }

    /// Insert or overwrite `key` on an object, returning the previous value.
    ///
    /// # Errors
    ///
    /// [`ValueError::TypeMismatch`] if `self` is not an object.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: DocumentValue,
    ) -> Result<Option<DocumentValue>, ValueError> {
        match self {
            Self::Object(map) => Ok(map.insert(key.into(), value)),
            other => Err(other.mismatch(ValueKind::Object)),
        }
    }

    /// Element `index` of an array.
    pub fn get_index(&self, index: usize) -> Option<&DocumentValue> {
        match self {
            Self::Array(items) => items.get(index),
            _ => None,
        }
    }

    pub fn get_index_mut(&mut self, index: usize) -> Option<&mut DocumentValue> {
        match self {
            Self::Array(items) => items.get_mut(index),
            _ => None,
        }
    }

    /// Append to an array.
    ///
    /// # Errors
    ///
    /// [`ValueError::TypeMismatch`] if `self` is not an array.
    pub fn push(&mut self, value: DocumentValue) -> Result<(), ValueError> {
        match self {
            Self::Array(items) => {
                items.push(value);
                Ok(())
            }
            other => Err(other.mismatch(ValueKind::Array)),
        }
    }

    /// Number of entries in an object or elements in an array; zero otherwise.
    pub fn len(&self) -> usize {
        match self {
            Self::Object(map) => map.len(),
            Self::Array(items) => items.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Value> for DocumentValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<DocumentValue> for Value {
    fn from(value: DocumentValue) -> Self {
        match value {
            DocumentValue::Null => Value::Null,
            DocumentValue::Bool(b) => Value::Bool(b),
            DocumentValue::Number(n) => Value::Number(n),
            DocumentValue::String(s) => Value::String(s),
            DocumentValue::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            DocumentValue::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<ObjectMap> for DocumentValue {
    fn from(map: ObjectMap) -> Self {
        Self::Object(map)
    }
}

impl From<bool> for DocumentValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for DocumentValue {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<i32> for DocumentValue {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl From<&str> for DocumentValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for DocumentValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

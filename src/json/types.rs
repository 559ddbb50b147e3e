//! JSON document values.
//!
//! [`JsonValue`] is the tagged union produced by tree-mode parsing. Each
//! parsed document is exclusively owned by its caller; values are plain
//! data with no sharing. Objects use a `BTreeMap`, and a key repeated
//! within one object overwrites the earlier value (insertion order is
//! irrelevant to the schema this crate consumes).

use std::collections::BTreeMap;

use crate::error::{Error, ParseResult};

/// A parsed JSON value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum JsonValue {
    /// JSON null literal
    #[default]
    Null,
    /// JSON boolean (true/false)
    Bool(bool),
    /// JSON number as a 64-bit float
    Number(f64),
    /// JSON string (decoded, valid UTF-8)
    String(String),
    /// JSON array of values
    Array(Vec<JsonValue>),
    /// JSON object; a repeated key keeps the last value written
    Object(BTreeMap<String, JsonValue>),
}

impl JsonValue {
    /// Returns true if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, JsonValue::Null)
    }

    /// Returns true if this is a boolean value.
    pub fn is_bool(&self) -> bool {
        matches!(self, JsonValue::Bool(_))
    }

    /// Returns true if this is a number value.
    pub fn is_number(&self) -> bool {
        matches!(self, JsonValue::Number(_))
    }

    /// Returns true if this is a string value.
    pub fn is_string(&self) -> bool {
        matches!(self, JsonValue::String(_))
    }

    /// Returns true if this is an array value.
    pub fn is_array(&self) -> bool {
        matches!(self, JsonValue::Array(_))
    }

    /// Returns true if this is an object value.
    pub fn is_object(&self) -> bool {
        matches!(self, JsonValue::Object(_))
    }

    /// The boolean payload, or a type-access error naming the actual tag.
    pub fn as_bool(&self) -> ParseResult<bool> {
        match self {
            JsonValue::Bool(b) => Ok(*b),
            other => Err(other.type_error("boolean")),
        }
    }

    /// The numeric payload, or a type-access error naming the actual tag.
    pub fn as_number(&self) -> ParseResult<f64> {
        match self {
            JsonValue::Number(n) => Ok(*n),
            other => Err(other.type_error("number")),
        }
    }

    /// The string payload, or a type-access error naming the actual tag.
    pub fn as_str(&self) -> ParseResult<&str> {
        match self {
            JsonValue::String(s) => Ok(s),
            other => Err(other.type_error("string")),
        }
    }

    /// The array payload, or a type-access error naming the actual tag.
    pub fn as_array(&self) -> ParseResult<&[JsonValue]> {
        match self {
            JsonValue::Array(items) => Ok(items),
            other => Err(other.type_error("array")),
        }
    }

    /// The object payload, or a type-access error naming the actual tag.
    pub fn as_object(&self) -> ParseResult<&BTreeMap<String, JsonValue>> {
        match self {
            JsonValue::Object(map) => Ok(map),
            other => Err(other.type_error("object")),
        }
    }

    /// Look up an object member by key; `None` for absent keys and for
    /// non-object values.
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        match self {
            JsonValue::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Look up an array element by index; `None` when out of range and for
    /// non-array values.
    pub fn get_index(&self, index: usize) -> Option<&JsonValue> {
        match self {
            JsonValue::Array(items) => items.get(index),
            _ => None,
        }
    }

    /// The tag name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            JsonValue::Null => "null",
            JsonValue::Bool(_) => "boolean",
            JsonValue::Number(_) => "number",
            JsonValue::String(_) => "string",
            JsonValue::Array(_) => "array",
            JsonValue::Object(_) => "object",
        }
    }

    fn type_error(&self, expected: &'static str) -> Error {
        Error::TypeMismatch {
            expected,
            actual: self.type_name(),
        }
    }
}

//! Normalized attribute values.
//!
//! Both backends deliver attribute data in their own wire shapes (multi-valued
//! directory attributes, arbitrary JSON nodes). After coercion every value is
//! one of the variants below, and the variant always matches the declared type
//! in the attribute mapping table — coercion never silently changes a declared
//! type.

use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// A normalized, type-tagged attribute value.
///
/// `Null` is the sentinel for "attribute exists in the mapping but the backend
/// had no value and the declared type has no empty default". It is a valid
/// value, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Null,
    String(String),
    Integer(i64),
    Boolean(bool),
    Array(Vec<String>),
    Map(HashMap<String, String>),
}

impl AttributeValue {
    /// True when this is the `Null` sentinel.
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// Borrow the string payload, if this value is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            AttributeValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow the array payload, if this value is an array.
    pub fn as_array(&self) -> Option<&[String]> {
        match self {
            AttributeValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, String>> {
        match self {
            AttributeValue::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

impl Serialize for AttributeValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            AttributeValue::Null => serializer.serialize_none(),
            AttributeValue::String(s) => serializer.serialize_str(s),
            AttributeValue::Integer(n) => serializer.serialize_i64(*n),
            AttributeValue::Boolean(b) => serializer.serialize_bool(*b),
            AttributeValue::Array(items) => items.serialize(serializer),
            AttributeValue::Map(entries) => entries.serialize(serializer),
        }
    }
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeValue::Null => f.write_str("null"),
            AttributeValue::String(s) => write!(f, "{s}"),
            AttributeValue::Integer(n) => write!(f, "{n}"),
            AttributeValue::Boolean(b) => write!(f, "{b}"),
            AttributeValue::Array(items) => write!(f, "[{}]", items.join(", ")),
            AttributeValue::Map(entries) => {
                // Deterministic order for log lines
                let mut keys: Vec<&String> = entries.keys().collect();
                keys.sort();
                let body: Vec<String> =
                    keys.iter().map(|k| format!("{k}={}", entries[*k])).collect();
                write!(f, "{{{}}}", body.join(", "))
            }
        }
    }
}

//! Value coercion.
//!
//! Converts a raw backend-native attribute value into a normalized
//! [`AttributeValue`] using the declared type from the mapping table.
//!
//! Two rules shape this module:
//! - an absent value has a type-specific empty default (`false`, `[]`, `{}`)
//!   or the `Null` sentinel;
//! - the declared type is authoritative. A multi-valued payload for a scalar
//!   type, or a scalar payload for a multi-valued type, is a configuration
//!   error on the caller's side and is reported as inconvertible rather than
//!   silently reconciled.

use crate::error::{BrokerError, BrokerResult};
use crate::mapping::{AttributeMapping, AttributeType};
use crate::model::AttributeValue;
use log::warn;
use serde_json::Value;
use std::collections::HashMap;

/// A raw attribute value as delivered by a backend, before coercion.
///
/// Directory backends deliver text (single- or multi-valued); the RPC backend
/// delivers arbitrary JSON nodes.
#[derive(Debug, Clone)]
pub enum RawValue {
    Text(String),
    Multi(Vec<String>),
    Json(Value),
}

/// Coerce a raw value to the mapping's declared type.
///
/// `None` means the backend had no value for the attribute; the result is the
/// declared type's empty default per the table below:
///
/// | declared type            | absent value |
/// |--------------------------|--------------|
/// | boolean                  | `false`      |
/// | array, large_array       | `[]`         |
/// | map_json, map_key_value  | `{}`         |
/// | everything else          | `Null`       |
pub fn coerce(raw: Option<RawValue>, mapping: &AttributeMapping) -> BrokerResult<AttributeValue> {
    let raw = match raw {
        // A JSON null is the RPC backend's way of saying "no value".
        None | Some(RawValue::Json(Value::Null)) => return Ok(empty_default(mapping.attr_type)),
        Some(raw) => raw,
    };

    match mapping.attr_type {
        AttributeType::String | AttributeType::LargeString => coerce_string(raw, mapping),
        AttributeType::Integer => coerce_integer(raw, mapping),
        AttributeType::Boolean => coerce_boolean(raw, mapping),
        AttributeType::Array | AttributeType::LargeArray => coerce_array(raw, mapping),
        AttributeType::MapJson => coerce_map_json(raw, mapping),
        AttributeType::MapKeyValue => coerce_map_key_value(raw, mapping),
    }
}

/// Coerce with the batch-fetch failure policy: an inconvertible value is
/// logged and reported as `Null` so the remaining attributes in the batch
/// still go through. Configuration and protocol errors still propagate.
pub fn coerce_lenient(raw: Option<RawValue>, mapping: &AttributeMapping) -> AttributeValue {
    match coerce(raw, mapping) {
        Ok(value) => value,
        Err(err) => {
            warn!(
                "dropping inconvertible value for attribute '{}': {err}",
                mapping.identifier
            );
            AttributeValue::Null
        }
    }
}

/// The empty default for an absent value of the given type.
pub fn empty_default(attr_type: AttributeType) -> AttributeValue {
    match attr_type {
        AttributeType::Boolean => AttributeValue::Boolean(false),
        AttributeType::Array | AttributeType::LargeArray => AttributeValue::Array(Vec::new()),
        AttributeType::MapJson | AttributeType::MapKeyValue => {
            AttributeValue::Map(HashMap::new())
        }
        _ => AttributeValue::Null,
    }
}

fn inconvertible(mapping: &AttributeMapping, raw: &dyn std::fmt::Debug) -> BrokerError {
    BrokerError::inconvertible(
        &mapping.identifier,
        mapping.attr_type.name(),
        format!("{raw:?}"),
    )
}

fn coerce_string(raw: RawValue, mapping: &AttributeMapping) -> BrokerResult<AttributeValue> {
    match raw {
        RawValue::Text(text) => Ok(AttributeValue::String(text)),
        RawValue::Json(Value::String(text)) => Ok(AttributeValue::String(text)),
        other => Err(inconvertible(mapping, &other)),
    }
}

fn coerce_integer(raw: RawValue, mapping: &AttributeMapping) -> BrokerResult<AttributeValue> {
    match raw {
        RawValue::Text(text) => text
            .parse::<i64>()
            .map(AttributeValue::Integer)
            .map_err(|_| inconvertible(mapping, &text)),
        RawValue::Json(Value::Number(num)) => num
            .as_i64()
            .map(AttributeValue::Integer)
            .ok_or_else(|| inconvertible(mapping, &num)),
        // Some RPC deployments serialize numeric attributes as strings.
        RawValue::Json(Value::String(text)) => text
            .parse::<i64>()
            .map(AttributeValue::Integer)
            .map_err(|_| inconvertible(mapping, &text)),
        other => Err(inconvertible(mapping, &other)),
    }
}

fn coerce_boolean(raw: RawValue, mapping: &AttributeMapping) -> BrokerResult<AttributeValue> {
    match raw {
        // Backend convention is case-sensitive "true"/"false".
        RawValue::Text(text) | RawValue::Json(Value::String(text)) => match text.as_str() {
            "true" => Ok(AttributeValue::Boolean(true)),
            "false" => Ok(AttributeValue::Boolean(false)),
            _ => Err(inconvertible(mapping, &text)),
        },
        RawValue::Json(Value::Bool(flag)) => Ok(AttributeValue::Boolean(flag)),
        other => Err(inconvertible(mapping, &other)),
    }
}

fn coerce_array(raw: RawValue, mapping: &AttributeMapping) -> BrokerResult<AttributeValue> {
    match raw {
        // Backend order is preserved; the engine never sorts array values.
        RawValue::Multi(items) => Ok(AttributeValue::Array(items)),
        RawValue::Json(Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(scalar_to_string(&item).ok_or_else(|| inconvertible(mapping, &item))?);
            }
            Ok(AttributeValue::Array(out))
        }
        other => Err(inconvertible(mapping, &other)),
    }
}

fn coerce_map_json(raw: RawValue, mapping: &AttributeMapping) -> BrokerResult<AttributeValue> {
    let object = match raw {
        RawValue::Text(text) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(object)) => object,
            _ => return Err(inconvertible(mapping, &text)),
        },
        RawValue::Json(Value::Object(object)) => object,
        other => return Err(inconvertible(mapping, &other)),
    };
    let mut entries = HashMap::with_capacity(object.len());
    for (key, value) in object {
        let text = scalar_to_string(&value).ok_or_else(|| inconvertible(mapping, &value))?;
        entries.insert(key, text);
    }
    Ok(AttributeValue::Map(entries))
}

fn coerce_map_key_value(raw: RawValue, mapping: &AttributeMapping) -> BrokerResult<AttributeValue> {
    let items = match raw {
        RawValue::Multi(items) => items,
        RawValue::Json(Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(scalar_to_string(&item).ok_or_else(|| inconvertible(mapping, &item))?);
            }
            out
        }
        other => return Err(inconvertible(mapping, &other)),
    };
    let mut entries = HashMap::with_capacity(items.len());
    for item in items {
        // Split at the first separator only: the key may not contain the
        // separator, the value may.
        match item.split_once(&mapping.separator) {
            Some((key, value)) => {
                entries.insert(key.to_string(), value.to_string());
            }
            None => return Err(inconvertible(mapping, &item)),
        }
    }
    Ok(AttributeValue::Map(entries))
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(num) => Some(num.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

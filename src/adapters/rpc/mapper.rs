//! RPC/JSON response to entity mapping.
//!
//! The RPC backend answers with JSON nodes. A `null` node means "not found"
//! and maps to `None`; a node with the wrong shape is a protocol error.
//!
//! Group unique names are not part of the group payload itself — they are
//! composed from the owning VO's short name, which the adapter resolves and
//! passes in alongside the raw groups.

use super::BACKEND;
use crate::error::{BrokerError, BrokerResult};
use crate::mapping::coerce::{RawValue, coerce_lenient, empty_default};
use crate::mapping::AttributeMappingTable;
use crate::model::{AttributeValue, Facility, Group, Member, MemberStatus, User, Vo};
use log::debug;
use serde_json::{Map, Value};
use std::collections::HashMap;

fn protocol(message: String) -> BrokerError {
    BrokerError::protocol(BACKEND, message)
}

fn as_object<'a>(value: &'a Value, context: &str) -> BrokerResult<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| protocol(format!("{context}: expected object, got {value}")))
}

fn field_i64(object: &Map<String, Value>, key: &str, context: &str) -> BrokerResult<i64> {
    object
        .get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| protocol(format!("{context}: missing numeric field '{key}'")))
}

fn optional_i64(object: &Map<String, Value>, key: &str) -> Option<i64> {
    object.get(key).and_then(Value::as_i64)
}

fn field_str<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    context: &str,
) -> BrokerResult<&'a str> {
    object
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| protocol(format!("{context}: missing string field '{key}'")))
}

fn optional_str(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_string)
}

pub fn map_user(value: &Value) -> BrokerResult<Option<User>> {
    if value.is_null() {
        return Ok(None);
    }
    let object = as_object(value, "user")?;
    let user = User::new(
        field_i64(object, "id", "user")?,
        optional_str(object, "firstName"),
        field_str(object, "lastName", "user")?.to_string(),
        optional_str(object, "login"),
    )
    .map_err(|err| protocol(format!("invalid user payload: {err}")))?;
    Ok(Some(user))
}

/// Map one group node; `vo_short_name` supplies the first component of the
/// composite unique name when the payload does not carry one itself.
pub fn map_group(value: &Value, vo_short_name: Option<&str>) -> BrokerResult<Option<Group>> {
    if value.is_null() {
        return Ok(None);
    }
    let object = as_object(value, "group")?;
    let name = field_str(object, "name", "group")?.to_string();
    let unique_name = optional_str(object, "uniqueName")
        .or_else(|| vo_short_name.map(|short| format!("{short}:{name}")));
    let group = Group::new(
        field_i64(object, "id", "group")?,
        optional_i64(object, "parentGroupId"),
        name,
        optional_str(object, "description").unwrap_or_default(),
        unique_name,
        field_i64(object, "voId", "group")?,
    )
    .map_err(|err| protocol(format!("invalid group payload: {err}")))?;
    Ok(Some(group))
}

/// Map an array of group nodes, composing unique names from the given VO
/// short names (keyed by VO id).
pub fn map_groups(
    value: &Value,
    vo_short_names: &HashMap<i64, String>,
) -> BrokerResult<Vec<Group>> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    let items = value
        .as_array()
        .ok_or_else(|| protocol(format!("groups: expected array, got {value}")))?;
    let mut groups = Vec::with_capacity(items.len());
    for item in items {
        let vo_id = item.get("voId").and_then(Value::as_i64);
        let short = vo_id.and_then(|id| vo_short_names.get(&id)).map(String::as_str);
        if let Some(group) = map_group(item, short)? {
            groups.push(group);
        }
    }
    Ok(groups)
}

pub fn map_facility(value: &Value) -> BrokerResult<Option<Facility>> {
    if value.is_null() {
        return Ok(None);
    }
    let object = as_object(value, "facility")?;
    let facility = Facility::new(
        field_i64(object, "id", "facility")?,
        field_str(object, "name", "facility")?.to_string(),
        optional_str(object, "description").unwrap_or_default(),
    )
    .map_err(|err| protocol(format!("invalid facility payload: {err}")))?;
    Ok(Some(facility))
}

pub fn map_vo(value: &Value) -> BrokerResult<Option<Vo>> {
    if value.is_null() {
        return Ok(None);
    }
    let object = as_object(value, "vo")?;
    let vo = Vo::new(
        field_i64(object, "id", "vo")?,
        optional_str(object, "name").unwrap_or_default(),
        field_str(object, "shortName", "vo")?.to_string(),
    )
    .map_err(|err| protocol(format!("invalid vo payload: {err}")))?;
    Ok(Some(vo))
}

pub fn map_member(value: &Value) -> BrokerResult<Option<Member>> {
    if value.is_null() {
        return Ok(None);
    }
    let object = as_object(value, "member")?;
    let status: MemberStatus = field_str(object, "status", "member")?
        .parse()
        .map_err(|err| protocol(format!("invalid member payload: {err}")))?;
    let member = Member::new(
        field_i64(object, "id", "member")?,
        field_i64(object, "userId", "member")?,
        field_i64(object, "voId", "member")?,
        status,
    )
    .map_err(|err| protocol(format!("invalid member payload: {err}")))?;
    Ok(Some(member))
}

/// Map an attribute array (`[{"name": ..., "value": ...}, ...]`) into
/// normalized values for the requested mappings.
///
/// Attributes not present in the requested set are dropped; requested
/// attributes the backend did not return get their type's empty default.
pub fn map_attributes(
    value: &Value,
    mappings: &[&crate::mapping::AttributeMapping],
    table: &AttributeMappingTable,
) -> BrokerResult<HashMap<String, AttributeValue>> {
    let mut raw_by_name: HashMap<String, Value> = HashMap::new();
    if !value.is_null() {
        let items = value
            .as_array()
            .ok_or_else(|| protocol(format!("attributes: expected array, got {value}")))?;
        for item in items {
            let object = as_object(item, "attribute")?;
            let name = field_str(object, "name", "attribute")?;
            if table.by_rpc_name(name).is_none() {
                debug!("dropping attribute '{name}' not present in the mapping table");
                continue;
            }
            let attr_value = object.get("value").cloned().unwrap_or(Value::Null);
            raw_by_name.insert(name.to_string(), attr_value);
        }
    }

    let mut values = HashMap::with_capacity(mappings.len());
    for mapping in mappings {
        let raw = mapping
            .rpc_name
            .as_deref()
            .and_then(|name| raw_by_name.remove(name))
            .map(RawValue::Json);
        let coerced = match raw {
            Some(raw) => coerce_lenient(Some(raw), mapping),
            None => empty_default(mapping.attr_type),
        };
        values.insert(mapping.identifier.clone(), coerced);
    }
    Ok(values)
}

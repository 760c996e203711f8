//! Directory entry to entity mapping.
//!
//! Translates directory entries into the shared entity model. An entry that
//! lacks a required attribute or carries a non-numeric id is a protocol
//! error: the directory answered, but not in the dialect this broker speaks.
//!
//! Attribute batch mapping goes through the mapping table: only attributes
//! present in the active mapping set are translated, everything else in the
//! entry is dropped.

use super::BACKEND;
use crate::connectors::DirectoryEntry;
use crate::error::{BrokerError, BrokerResult};
use crate::mapping::coerce::{RawValue, coerce_lenient};
use crate::mapping::AttributeMapping;
use crate::model::{AttributeValue, Facility, Group, Member, MemberStatus, User, Vo};
use std::collections::HashMap;

// Directory attribute names for entity fields.
pub const ATTR_USER_ID: &str = "userId";
pub const ATTR_GIVEN_NAME: &str = "givenName";
pub const ATTR_SN: &str = "sn";
pub const ATTR_LOGIN: &str = "login";
pub const ATTR_PRINCIPAL_NAMES: &str = "eduPersonPrincipalNames";
pub const ATTR_GROUP_ID: &str = "groupId";
pub const ATTR_PARENT_GROUP_ID: &str = "parentGroupId";
pub const ATTR_CN: &str = "cn";
pub const ATTR_DESCRIPTION: &str = "description";
pub const ATTR_UNIQUE_GROUP_NAME: &str = "uniqueGroupName";
pub const ATTR_VO_ID: &str = "voId";
pub const ATTR_VO_SHORT_NAME: &str = "o";
pub const ATTR_FACILITY_ID: &str = "facilityId";
pub const ATTR_ASSIGNED_GROUP_ID: &str = "assignedGroupId";
pub const ATTR_UNIQUE_MEMBER: &str = "uniqueMember";
pub const ATTR_MEMBER_ID: &str = "memberId";
pub const ATTR_MEMBER_STATUS: &str = "memberStatus";

fn protocol(message: String) -> BrokerError {
    BrokerError::protocol(BACKEND, message)
}

fn required<'a>(entry: &'a DirectoryEntry, attribute: &str) -> BrokerResult<&'a str> {
    entry
        .first(attribute)
        .ok_or_else(|| protocol(format!("entry '{}' is missing '{attribute}'", entry.dn)))
}

fn required_id(entry: &DirectoryEntry, attribute: &str) -> BrokerResult<i64> {
    let raw = required(entry, attribute)?;
    raw.parse::<i64>()
        .map_err(|_| protocol(format!("entry '{}' has non-numeric {attribute} '{raw}'", entry.dn)))
}

fn optional_id(entry: &DirectoryEntry, attribute: &str) -> BrokerResult<Option<i64>> {
    match entry.first(attribute) {
        None => Ok(None),
        Some(raw) => raw.parse::<i64>().map(Some).map_err(|_| {
            protocol(format!("entry '{}' has non-numeric {attribute} '{raw}'", entry.dn))
        }),
    }
}

pub fn map_user(entry: &DirectoryEntry) -> BrokerResult<User> {
    User::new(
        required_id(entry, ATTR_USER_ID)?,
        entry.first(ATTR_GIVEN_NAME).map(str::to_string),
        required(entry, ATTR_SN)?.to_string(),
        entry.first(ATTR_LOGIN).map(str::to_string),
    )
    .map_err(|err| protocol(format!("invalid user entry '{}': {err}", entry.dn)))
}

pub fn map_group(entry: &DirectoryEntry) -> BrokerResult<Group> {
    Group::new(
        required_id(entry, ATTR_GROUP_ID)?,
        optional_id(entry, ATTR_PARENT_GROUP_ID)?,
        required(entry, ATTR_CN)?.to_string(),
        entry.first(ATTR_DESCRIPTION).unwrap_or_default().to_string(),
        entry.first(ATTR_UNIQUE_GROUP_NAME).map(str::to_string),
        required_id(entry, ATTR_VO_ID)?,
    )
    .map_err(|err| protocol(format!("invalid group entry '{}': {err}", entry.dn)))
}

pub fn map_groups(entries: &[DirectoryEntry]) -> BrokerResult<Vec<Group>> {
    entries.iter().map(map_group).collect()
}

pub fn map_facility(entry: &DirectoryEntry) -> BrokerResult<Facility> {
    Facility::new(
        required_id(entry, ATTR_FACILITY_ID)?,
        required(entry, ATTR_CN)?.to_string(),
        entry.first(ATTR_DESCRIPTION).unwrap_or_default().to_string(),
    )
    .map_err(|err| protocol(format!("invalid facility entry '{}': {err}", entry.dn)))
}

pub fn map_vo(entry: &DirectoryEntry) -> BrokerResult<Vo> {
    Vo::new(
        required_id(entry, ATTR_VO_ID)?,
        entry.first(ATTR_DESCRIPTION).unwrap_or_default().to_string(),
        required(entry, ATTR_VO_SHORT_NAME)?.to_string(),
    )
    .map_err(|err| protocol(format!("invalid vo entry '{}': {err}", entry.dn)))
}

pub fn map_member(entry: &DirectoryEntry) -> BrokerResult<Member> {
    let status: MemberStatus = required(entry, ATTR_MEMBER_STATUS)?
        .parse()
        .map_err(|err| protocol(format!("invalid member entry '{}': {err}", entry.dn)))?;
    Member::new(
        required_id(entry, ATTR_MEMBER_ID)?,
        required_id(entry, ATTR_USER_ID)?,
        required_id(entry, ATTR_VO_ID)?,
        status,
    )
    .map_err(|err| protocol(format!("invalid member entry '{}': {err}", entry.dn)))
}

/// Map the requested attributes out of one entry, keyed by internal
/// identifier.
///
/// Missing values take the declared type's empty default; a value that fails
/// coercion is reported as `Null` with a warning so the rest of the batch
/// survives.
pub fn map_attributes(
    entry: Option<&DirectoryEntry>,
    mappings: &[&AttributeMapping],
) -> HashMap<String, AttributeValue> {
    let mut values = HashMap::with_capacity(mappings.len());
    for mapping in mappings {
        let raw = mapping.ldap_name.as_deref().and_then(|name| {
            let attr_values = entry?.attributes.get(name)?;
            if attr_values.is_empty() {
                return None;
            }
            if mapping.attr_type.is_multi_valued() || attr_values.len() > 1 {
                Some(RawValue::Multi(attr_values.clone()))
            } else {
                Some(RawValue::Text(attr_values[0].clone()))
            }
        });
        values.insert(mapping.identifier.clone(), coerce_lenient(raw, mapping));
    }
    values
}

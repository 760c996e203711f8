//! Attribute mapping table.
//!
//! Attribute identifiers used by callers are internal, stable names. Each
//! backend knows the same logical attribute under its own protocol-specific
//! name, and each attribute carries a declared value type that drives
//! coercion. The table binding the three together is loaded once at startup
//! from an ordered list of records and is read-only for the process lifetime,
//! which makes it safe to share across any number of concurrent requests.
//!
//! Resolution has two deliberate failure policies:
//! - [`AttributeMappingTable::resolve`] treats an unknown identifier as a
//!   configuration error, because the caller named it explicitly;
//! - [`AttributeMappingTable::resolve_many`] skips unknown identifiers with a
//!   warning, so one misconfigured entry does not block a whole batch fetch.

pub mod coerce;

use crate::error::{BrokerError, BrokerResult};
use log::warn;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

fn default_separator() -> String {
    ",".to_string()
}

/// Declared value type of a mapped attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    LargeString,
    Integer,
    Boolean,
    Array,
    LargeArray,
    MapJson,
    MapKeyValue,
}

impl AttributeType {
    /// Short name used in error messages and logs.
    pub fn name(&self) -> &'static str {
        match self {
            AttributeType::String => "string",
            AttributeType::LargeString => "large_string",
            AttributeType::Integer => "integer",
            AttributeType::Boolean => "boolean",
            AttributeType::Array => "array",
            AttributeType::LargeArray => "large_array",
            AttributeType::MapJson => "map_json",
            AttributeType::MapKeyValue => "map_key_value",
        }
    }

    /// Whether the backend delivers this type as a multi-valued payload.
    pub fn is_multi_valued(&self) -> bool {
        matches!(
            self,
            AttributeType::Array
                | AttributeType::LargeArray
                | AttributeType::MapKeyValue
        )
    }
}

/// One attribute mapping record.
///
/// A backend name may be absent, meaning the attribute is not fetchable from
/// that backend; adapters report such attributes with their type's empty
/// default instead of failing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeMapping {
    pub identifier: String,
    #[serde(default)]
    pub ldap_name: Option<String>,
    #[serde(default)]
    pub rpc_name: Option<String>,
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
    /// Separator for `map_key_value` decoding; splits at the first
    /// occurrence only, so values may contain the separator.
    #[serde(default = "default_separator")]
    pub separator: String,
}

/// The loaded, immutable mapping table.
#[derive(Debug, Default)]
pub struct AttributeMappingTable {
    entries: HashMap<String, AttributeMapping>,
}

impl AttributeMappingTable {
    /// Build a table from an ordered list of entries.
    ///
    /// Later entries with a duplicate identifier overwrite earlier ones.
    pub fn from_entries(entries: Vec<AttributeMapping>) -> Self {
        let mut table = HashMap::with_capacity(entries.len());
        for entry in entries {
            if table.insert(entry.identifier.clone(), entry).is_some() {
                warn!("duplicate attribute mapping entry, keeping the later one");
            }
        }
        Self { entries: table }
    }

    /// Load a table from a JSON list of mapping records.
    ///
    /// A malformed or unreadable source yields an empty table with a warning
    /// rather than a startup failure; consumers must handle resolution
    /// failures defensively in that case.
    pub fn from_reader(reader: impl Read) -> Self {
        match serde_json::from_reader::<_, Vec<AttributeMapping>>(reader) {
            Ok(entries) => Self::from_entries(entries),
            Err(err) => {
                warn!("attribute mapping source is malformed, starting with empty table: {err}");
                Self::default()
            }
        }
    }

    /// Load a table from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match std::fs::File::open(path.as_ref()) {
            Ok(file) => Self::from_reader(file),
            Err(err) => {
                warn!(
                    "attribute mapping file '{}' unreadable, starting with empty table: {err}",
                    path.as_ref().display()
                );
                Self::default()
            }
        }
    }

    /// Resolve one internal identifier; unknown identifiers are a
    /// configuration error.
    pub fn resolve(&self, identifier: &str) -> BrokerResult<&AttributeMapping> {
        self.entries.get(identifier).ok_or_else(|| {
            BrokerError::configuration(format!("unknown attribute identifier '{identifier}'"))
        })
    }

    /// Resolve a batch of identifiers, skipping unknown ones with a warning.
    pub fn resolve_many<I, S>(&self, identifiers: I) -> Vec<&AttributeMapping>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut resolved = Vec::new();
        for identifier in identifiers {
            match self.entries.get(identifier.as_ref()) {
                Some(mapping) => resolved.push(mapping),
                None => warn!(
                    "skipping unknown attribute identifier '{}' in batch resolve",
                    identifier.as_ref()
                ),
            }
        }
        resolved
    }

    /// Find the mapping whose directory-protocol name matches.
    pub fn by_ldap_name(&self, name: &str) -> Option<&AttributeMapping> {
        self.entries
            .values()
            .find(|m| m.ldap_name.as_deref() == Some(name))
    }

    /// Find the mapping whose RPC-protocol name matches.
    pub fn by_rpc_name(&self, name: &str) -> Option<&AttributeMapping> {
        self.entries
            .values()
            .find(|m| m.rpc_name.as_deref() == Some(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

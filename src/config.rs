//! Per-operation adapter preferences.
//!
//! Logical operations can each prefer a backend adapter and carry
//! operation-specific options (entitlement prefix and authority, default
//! field sets). Preferences are loaded once from an ordered JSON list; a
//! missing source simply means no preferences, and every operation falls
//! back to the full-capability adapter.

use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Configuration record for one logical operation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationConfig {
    pub operation: String,
    /// Preferred adapter name (`"ldap"` or `"rpc"`); absent or unknown
    /// values fall back to the full-capability adapter.
    #[serde(default)]
    pub adapter: Option<String>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub authority: Option<String>,
    #[serde(default)]
    pub default_fields: Vec<String>,
    /// Remaining operation-specific options, passed through untyped.
    #[serde(flatten)]
    pub options: HashMap<String, Value>,
}

impl OperationConfig {
    /// Fetch a string-valued option from the untyped remainder.
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(Value::as_str)
    }
}

/// The loaded, immutable preference set.
#[derive(Debug, Default)]
pub struct OperationPreferences {
    configs: HashMap<String, OperationConfig>,
}

impl OperationPreferences {
    /// Build from an ordered list; later duplicates of the same operation
    /// name overwrite earlier ones.
    pub fn from_entries(entries: Vec<OperationConfig>) -> Self {
        let mut configs = HashMap::with_capacity(entries.len());
        for entry in entries {
            configs.insert(entry.operation.clone(), entry);
        }
        Self { configs }
    }

    /// Load from a JSON list of operation records.
    pub fn from_reader(reader: impl Read) -> Self {
        match serde_json::from_reader::<_, Vec<OperationConfig>>(reader) {
            Ok(entries) => Self::from_entries(entries),
            Err(err) => {
                warn!("operation preference source is malformed, using defaults: {err}");
                Self::default()
            }
        }
    }

    /// Load from a JSON file; a missing file means no preferences.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match std::fs::File::open(path.as_ref()) {
            Ok(file) => Self::from_reader(file),
            Err(err) => {
                debug!(
                    "no operation preference file at '{}' ({err}), using defaults",
                    path.as_ref().display()
                );
                Self::default()
            }
        }
    }

    pub fn get(&self, operation: &str) -> Option<&OperationConfig> {
        self.configs.get(operation)
    }

    /// The preferred adapter name for an operation, if one is configured.
    pub fn adapter_for(&self, operation: &str) -> Option<&str> {
        self.configs
            .get(operation)
            .and_then(|config| config.adapter.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

//! Adapter selection.
//!
//! Chooses which adapter implementation handles a logical operation based on
//! per-operation configuration. The RPC adapter is the guaranteed
//! full-capability default: an unknown or unspecified preference, or a
//! preference for a directory adapter that was never configured, always
//! resolves to it.

use super::{AdapterRef, LdapAdapter, RpcAdapter};
use crate::config::OperationPreferences;
use crate::connectors::{DirectoryConnector, RpcConnector};
use log::warn;

/// Preference value selecting the directory adapter.
pub const ADAPTER_LDAP: &str = "ldap";
/// Preference value selecting the RPC adapter.
pub const ADAPTER_RPC: &str = "rpc";

/// Holds both adapter implementations and the preference table.
pub struct AdapterSelector<D: DirectoryConnector, R: RpcConnector> {
    ldap: Option<LdapAdapter<D>>,
    rpc: RpcAdapter<R>,
    preferences: OperationPreferences,
}

impl<D: DirectoryConnector, R: RpcConnector> AdapterSelector<D, R> {
    pub fn new(
        rpc: RpcAdapter<R>,
        ldap: Option<LdapAdapter<D>>,
        preferences: OperationPreferences,
    ) -> Self {
        Self {
            ldap,
            rpc,
            preferences,
        }
    }

    /// Choose the adapter for a logical operation.
    pub fn select(&self, operation: &str) -> AdapterRef<'_, D, R> {
        match self.preferences.adapter_for(operation) {
            Some(ADAPTER_LDAP) => match &self.ldap {
                Some(ldap) => AdapterRef::Ldap(ldap),
                None => {
                    warn!(
                        "operation '{operation}' prefers the directory adapter but none is \
                         configured, using rpc"
                    );
                    AdapterRef::Rpc(&self.rpc)
                }
            },
            Some(ADAPTER_RPC) | None => AdapterRef::Rpc(&self.rpc),
            Some(other) => {
                warn!("operation '{operation}' prefers unknown adapter '{other}', using rpc");
                AdapterRef::Rpc(&self.rpc)
            }
        }
    }

    /// Direct access to the full-capability adapter, for operations the
    /// directory backend does not support (mutation, extended lookups).
    pub fn rpc(&self) -> &RpcAdapter<R> {
        &self.rpc
    }

    /// The preference table this selector consults.
    pub fn preferences(&self) -> &OperationPreferences {
        &self.preferences
    }
}

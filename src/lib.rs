//! Identity-broker gateway core.
//!
//! Answers two questions for a relying service: who is this user in the
//! central identity registry, and what entitlements do they hold for a given
//! facility — identically, regardless of which of two heterogeneous backend
//! protocols (a directory-query protocol and an RPC/JSON protocol) is
//! configured as preferred for an operation.
//!
//! # Core Components
//!
//! - [`AttributeMappingTable`] - internal identifier to per-backend name and
//!   declared value type
//! - [`DataAdapter`] - the common lookup surface over both backends
//! - [`AdapterSelector`] - per-operation backend choice
//! - [`EntitlementEngine`] - AARC-format entitlement derivation
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use idbroker::{
//!     AdapterSelector, AttributeMappingTable, EntitlementEngine, OperationPreferences,
//!     RpcAdapter,
//! };
//! use std::sync::Arc;
//!
//! # fn example(rpc_connector: impl idbroker::RpcConnector) {
//! let table = Arc::new(AttributeMappingTable::from_path("attribute_map.json"));
//! let rpc = RpcAdapter::new(rpc_connector, Arc::clone(&table));
//! let preferences = OperationPreferences::from_path("operations.json");
//! let selector = AdapterSelector::<idbroker::NoDirectory, _>::new(rpc, None, preferences);
//! let engine = EntitlementEngine::from_preferences(selector);
//! # }
//! ```
//!
//! The crate owns no transport: implement [`DirectoryConnector`] and
//! [`RpcConnector`] over your pooled clients and hand them to the adapters.
//! Requests execute synchronously on the caller's task, and the only shared
//! state is the read-only mapping table.

pub mod adapters;
pub mod config;
pub mod connectors;
pub mod entitlement;
pub mod error;
pub mod mapping;
pub mod model;

// Re-export commonly used types for convenience
pub use adapters::{
    ADAPTER_LDAP, ADAPTER_RPC, AdapterRef, AdapterSelector, DataAdapter, DirectoryLayout,
    LdapAdapter, RpcAdapter,
};
pub use config::{OperationConfig, OperationPreferences};
pub use connectors::{
    ConnectorError, DirectoryConnector, DirectoryEntry, DirectoryFilter, NoDirectory, RpcConnector,
};
pub use entitlement::{
    EntitlementConfig, EntitlementEngine, OPERATION_GET_USER_ENTITLEMENTS,
    format_capability_entitlement, format_group_entitlement,
};
pub use error::{BrokerError, BrokerResult};
pub use mapping::coerce::{RawValue, coerce};
pub use mapping::{AttributeMapping, AttributeMappingTable, AttributeType};
pub use model::{
    AttributeValue, Entity, EntityError, Facility, Group, Member, MemberStatus, User, Vo,
};

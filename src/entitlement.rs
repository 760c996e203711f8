//! Entitlement derivation.
//!
//! Produces the AARC-format entitlement strings a user holds for a facility
//! by combining three independent sources:
//!
//! 1. forwarded entitlements — pre-formatted values received from an
//!    upstream source and passed through verbatim;
//! 2. group-membership entitlements — one per group the user belongs to
//!    *and* that is assigned to the facility, formatted as
//!    `prefix:group:<urlencoded-name>#authority`;
//! 3. capability entitlements — named permission grants from facility and
//!    group configuration, formatted as `prefix:<capability>#authority`.
//!
//! Sources are combined in that fixed order, then the final list is sorted
//! lexicographically and deduplicated. The sort is an output contract:
//! identical backend state always yields identical results, regardless of
//! backend response order.
//!
//! Each optional source degrades gracefully when its attribute identifier is
//! not configured; only `prefix` and `authority` are hard requirements,
//! checked before any backend call.

use crate::adapters::{AdapterRef, AdapterSelector, DataAdapter};
use crate::config::OperationConfig;
use crate::connectors::{DirectoryConnector, RpcConnector};
use crate::error::{BrokerError, BrokerResult};
use crate::model::Entity;
use log::debug;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use std::collections::BTreeSet;
use std::slice;

/// Operation name under which entitlement derivation looks up its adapter
/// preference and options.
pub const OPERATION_GET_USER_ENTITLEMENTS: &str = "get_user_entitlements";

/// Suffix marking a VO's implicit top-level membership group; stripped from
/// unique group names before formatting.
const MEMBERS_SUFFIX: &str = ":members";

/// Characters percent-encoded inside entitlement names. Colons survive —
/// they separate group path components in the AARC shape.
const ENTITLEMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'>')
    .add(b'?');

/// Options for entitlement derivation.
///
/// `prefix` and `authority` are mandatory at call time; the attribute
/// identifiers are optional and each disables its source when absent.
#[derive(Debug, Clone, Default)]
pub struct EntitlementConfig {
    pub prefix: Option<String>,
    pub authority: Option<String>,
    pub forwarded_entitlements_attr: Option<String>,
    pub facility_capabilities_attr: Option<String>,
    pub resource_capabilities_attr: Option<String>,
}

impl EntitlementConfig {
    /// Extract entitlement options from an operation configuration record.
    pub fn from_operation(config: &OperationConfig) -> Self {
        Self {
            prefix: config.prefix.clone(),
            authority: config.authority.clone(),
            forwarded_entitlements_attr: config
                .option_str("forwardedEntitlementsAttr")
                .map(str::to_string),
            facility_capabilities_attr: config
                .option_str("facilityCapabilitiesAttr")
                .map(str::to_string),
            resource_capabilities_attr: config
                .option_str("resourceCapabilitiesAttr")
                .map(str::to_string),
        }
    }
}

/// Format one group-membership entitlement.
///
/// A trailing `:members` token (the VO's implicit top-level group) is
/// stripped first, so membership in `vo1:members` asserts `vo1` itself.
pub fn format_group_entitlement(prefix: &str, unique_name: &str, authority: &str) -> String {
    let name = unique_name.strip_suffix(MEMBERS_SUFFIX).unwrap_or(unique_name);
    format!(
        "{prefix}:group:{}#{authority}",
        utf8_percent_encode(name, ENTITLEMENT_ENCODE_SET)
    )
}

/// Format one capability entitlement.
pub fn format_capability_entitlement(prefix: &str, capability: &str, authority: &str) -> String {
    format!(
        "{prefix}:{}#{authority}",
        utf8_percent_encode(capability, ENTITLEMENT_ENCODE_SET)
    )
}

/// Derives entitlements through a selector-chosen data adapter.
pub struct EntitlementEngine<D: DirectoryConnector, R: RpcConnector> {
    selector: AdapterSelector<D, R>,
    config: EntitlementConfig,
}

impl<D: DirectoryConnector, R: RpcConnector> EntitlementEngine<D, R> {
    pub fn new(selector: AdapterSelector<D, R>, config: EntitlementConfig) -> Self {
        Self { selector, config }
    }

    /// Build an engine whose options come from the selector's own
    /// per-operation preferences.
    pub fn from_preferences(selector: AdapterSelector<D, R>) -> Self {
        let config = selector
            .preferences()
            .get(OPERATION_GET_USER_ENTITLEMENTS)
            .map(EntitlementConfig::from_operation)
            .unwrap_or_default();
        Self::new(selector, config)
    }

    pub fn selector(&self) -> &AdapterSelector<D, R> {
        &self.selector
    }

    /// Compute the sorted, deduplicated entitlement list for one user at one
    /// facility.
    pub async fn entitlements_for_user_at_facility(
        &self,
        user_id: i64,
        facility_id: i64,
    ) -> BrokerResult<Vec<String>> {
        let prefix = self
            .config
            .prefix
            .as_deref()
            .ok_or_else(|| BrokerError::configuration("entitlement prefix is not configured"))?;
        let authority = self
            .config
            .authority
            .as_deref()
            .ok_or_else(|| BrokerError::configuration("entitlement authority is not configured"))?;

        let adapter = self.selector.select(OPERATION_GET_USER_ENTITLEMENTS);
        debug!(
            "deriving entitlements for user {user_id} at facility {facility_id} via {}",
            adapter.backend()
        );

        let mut entitlements = self.forwarded_entitlements(adapter, user_id).await?;

        let groups = adapter.users_groups_on_facility(facility_id, user_id).await?;
        for group in &groups {
            if let Some(unique_name) = group.unique_name() {
                entitlements.push(format_group_entitlement(prefix, unique_name, authority));
            }
        }

        for capability in self.capabilities(adapter, facility_id, &groups).await? {
            entitlements.push(format_capability_entitlement(prefix, &capability, authority));
        }

        entitlements.sort();
        entitlements.dedup();
        Ok(entitlements)
    }

    /// Forwarded entitlements pass through verbatim; an unconfigured
    /// identifier disables the source.
    async fn forwarded_entitlements(
        &self,
        adapter: AdapterRef<'_, D, R>,
        user_id: i64,
    ) -> BrokerResult<Vec<String>> {
        let Some(attr) = &self.config.forwarded_entitlements_attr else {
            return Ok(Vec::new());
        };
        let values = adapter
            .attribute_values(Entity::User, user_id, slice::from_ref(attr))
            .await?;
        Ok(values
            .get(attr)
            .and_then(|value| value.as_array())
            .map(<[String]>::to_vec)
            .unwrap_or_default())
    }

    /// Capability strings scoped to the facility and the user's groups on
    /// it, deduplicated before formatting.
    async fn capabilities(
        &self,
        adapter: AdapterRef<'_, D, R>,
        facility_id: i64,
        groups: &[crate::model::Group],
    ) -> BrokerResult<BTreeSet<String>> {
        let mut capabilities = BTreeSet::new();
        if groups.is_empty() {
            return Ok(capabilities);
        }

        if let Some(attr) = &self.config.facility_capabilities_attr {
            let values = adapter
                .attribute_values(Entity::Facility, facility_id, slice::from_ref(attr))
                .await?;
            if let Some(items) = values.get(attr).and_then(|value| value.as_array()) {
                capabilities.extend(items.iter().cloned());
            }
        }

        if let Some(attr) = &self.config.resource_capabilities_attr {
            for group in groups {
                let values = adapter
                    .attribute_values(Entity::Group, group.id(), slice::from_ref(attr))
                    .await?;
                if let Some(items) = values.get(attr).and_then(|value| value.as_array()) {
                    capabilities.extend(items.iter().cloned());
                }
            }
        }

        Ok(capabilities)
    }
}

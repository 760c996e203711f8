//! Directory-protocol data adapter.
//!
//! Read-only queries against a hierarchical namespace. Entity identity is
//! expressed through structured names under per-entity subtrees, and every
//! lookup is an attribute-equality search; the backend offers no server-side
//! joins, so group membership is resolved by reverse-attribute scans and
//! intersections happen locally.
//!
//! This adapter supports the restricted operation subset only: entity
//! lookups and attribute reads. Mutation and the extended lookups live on
//! the RPC adapter; callers needing them must address that adapter directly.

pub mod mapper;

use crate::connectors::{ConnectorError, DirectoryConnector, DirectoryEntry, DirectoryFilter};
use crate::error::{BrokerError, BrokerResult};
use crate::mapping::AttributeMappingTable;
use crate::model::{AttributeValue, Entity, Facility, Group, User};
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

use super::DataAdapter;

/// Backend name used in errors and logs.
pub const BACKEND: &str = "ldap";

/// Subtree layout of the directory namespace.
#[derive(Debug, Clone)]
pub struct DirectoryLayout {
    pub user_base: String,
    pub group_base: String,
    pub facility_base: String,
    pub vo_base: String,
}

impl DirectoryLayout {
    /// Conventional layout under one root: `ou=users`, `ou=groups`,
    /// `ou=facilities`, `ou=vos`.
    pub fn under(root: &str) -> Self {
        Self {
            user_base: format!("ou=users,{root}"),
            group_base: format!("ou=groups,{root}"),
            facility_base: format!("ou=facilities,{root}"),
            vo_base: format!("ou=vos,{root}"),
        }
    }
}

/// The directory-backed adapter.
pub struct LdapAdapter<C> {
    connector: C,
    layout: DirectoryLayout,
    table: Arc<AttributeMappingTable>,
}

impl<C: DirectoryConnector> LdapAdapter<C> {
    pub fn new(connector: C, layout: DirectoryLayout, table: Arc<AttributeMappingTable>) -> Self {
        Self {
            connector,
            layout,
            table,
        }
    }

    async fn search(
        &self,
        base: &str,
        filter: &DirectoryFilter,
    ) -> BrokerResult<Vec<DirectoryEntry>> {
        debug!("ldap search base='{base}' filter='{filter}'");
        self.connector
            .search(base, filter)
            .await
            .map_err(|err| match err {
                ConnectorError::Connection(source) => BrokerError::BackendConnection {
                    backend: BACKEND,
                    source,
                },
                ConnectorError::Protocol(message) => BrokerError::protocol(BACKEND, message),
            })
    }

    /// The DN a group's member attribute uses to reference a user.
    fn user_dn(&self, user_id: i64) -> String {
        format!("{}={user_id},{}", mapper::ATTR_USER_ID, self.layout.user_base)
    }

    fn entity_base(&self, entity: Entity) -> BrokerResult<(&str, &'static str)> {
        match entity {
            Entity::User => Ok((&self.layout.user_base, mapper::ATTR_USER_ID)),
            Entity::Group => Ok((&self.layout.group_base, mapper::ATTR_GROUP_ID)),
            Entity::Facility => Ok((&self.layout.facility_base, mapper::ATTR_FACILITY_ID)),
            Entity::Vo => Ok((&self.layout.vo_base, mapper::ATTR_VO_ID)),
            // Memberships have no subtree of their own in the directory.
            Entity::Member => Err(BrokerError::configuration(
                "member attributes are not available from the directory backend",
            )),
        }
    }
}

impl<C: DirectoryConnector> DataAdapter for LdapAdapter<C> {
    /// Directory entries carry external logins already qualified by their
    /// source (scoped principal names), so only the login candidates
    /// participate in the filter here; the external-source id is an RPC-side
    /// concept.
    fn find_user_by_external_logins(
        &self,
        _idp_identifier: &str,
        login_candidates: &[String],
    ) -> impl std::future::Future<Output = BrokerResult<Option<User>>> + Send {
        async move {
            for candidate in login_candidates {
                let filter = DirectoryFilter::eq(mapper::ATTR_PRINCIPAL_NAMES, candidate.as_str());
                let entries = self.search(&self.layout.user_base, &filter).await?;
                if let Some(entry) = entries.first() {
                    return mapper::map_user(entry).map(Some);
                }
            }
            Ok(None)
        }
    }

    /// Reverse-attribute scan: groups referencing the user's DN in their
    /// member attribute, restricted to one VO.
    fn groups_of_user_in_vo(
        &self,
        user_id: i64,
        vo_id: i64,
    ) -> impl std::future::Future<Output = BrokerResult<Vec<Group>>> + Send {
        async move {
            let filter = DirectoryFilter::and(vec![
                DirectoryFilter::eq(mapper::ATTR_VO_ID, vo_id.to_string()),
                DirectoryFilter::eq(mapper::ATTR_UNIQUE_MEMBER, self.user_dn(user_id)),
            ]);
            let entries = self.search(&self.layout.group_base, &filter).await?;
            mapper::map_groups(&entries)
        }
    }

    /// The facility entry lists assigned group ids; each id is then resolved
    /// to a full group entry.
    fn groups_assigned_to_facility(
        &self,
        facility_id: i64,
    ) -> impl std::future::Future<Output = BrokerResult<Vec<Group>>> + Send {
        async move {
            let filter = DirectoryFilter::eq(mapper::ATTR_FACILITY_ID, facility_id.to_string());
            let entries = self.search(&self.layout.facility_base, &filter).await?;
            let Some(facility_entry) = entries.first() else {
                return Ok(Vec::new());
            };

            let group_ids = facility_entry.values(mapper::ATTR_ASSIGNED_GROUP_ID);
            if group_ids.is_empty() {
                return Ok(Vec::new());
            }

            let id_filters = group_ids
                .iter()
                .map(|id| DirectoryFilter::eq(mapper::ATTR_GROUP_ID, id.as_str()))
                .collect();
            let group_entries = self
                .search(&self.layout.group_base, &DirectoryFilter::or(id_filters))
                .await?;
            mapper::map_groups(&group_entries)
        }
    }

    fn attribute_values(
        &self,
        entity: Entity,
        entity_id: i64,
        identifiers: &[String],
    ) -> impl std::future::Future<Output = BrokerResult<HashMap<String, AttributeValue>>> + Send
    {
        async move {
            let mappings = self.table.resolve_many(identifiers);
            if mappings.is_empty() {
                return Ok(HashMap::new());
            }
            let (base, id_attribute) = self.entity_base(entity)?;
            let filter = DirectoryFilter::eq(id_attribute, entity_id.to_string());
            let entries = self.search(base, &filter).await?;
            Ok(mapper::map_attributes(entries.first(), &mappings))
        }
    }

    fn facilities_by_attribute(
        &self,
        identifier: &str,
        value: &str,
    ) -> impl std::future::Future<Output = BrokerResult<Vec<Facility>>> + Send {
        async move {
            let mapping = self.table.resolve(identifier)?;
            let Some(ldap_name) = mapping.ldap_name.as_deref() else {
                return Err(BrokerError::configuration(format!(
                    "attribute '{identifier}' has no directory name configured"
                )));
            };
            let filter = DirectoryFilter::eq(ldap_name, value);
            let entries = self.search(&self.layout.facility_base, &filter).await?;
            entries.iter().map(mapper::map_facility).collect()
        }
    }
}

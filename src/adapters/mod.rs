//! Data adapters over the two backend protocols.
//!
//! Both backends expose the same logical entities through incompatible wire
//! representations. Each adapter composes a transport connector, a response
//! mapper and the shared attribute mapping table, and answers the common
//! lookup surface defined by [`DataAdapter`]. How a logical query is
//! satisfied is backend-specific: the directory adapter scans reverse
//! membership attributes, the RPC adapter walks manager calls.
//!
//! The RPC adapter is the full-capability implementation; it additionally
//! supports mutation and extended entity lookups as inherent methods. The
//! directory adapter deliberately carries only the restricted subset — a
//! caller that needs more must address the RPC adapter directly, which keeps
//! the limitation visible instead of hiding it behind the common interface.

pub mod ldap;
pub mod rpc;
pub mod selector;

pub use ldap::{DirectoryLayout, LdapAdapter};
pub use rpc::RpcAdapter;
pub use selector::{ADAPTER_LDAP, ADAPTER_RPC, AdapterSelector};

use crate::connectors::{DirectoryConnector, RpcConnector};
use crate::error::BrokerResult;
use crate::model::{AttributeValue, Entity, Facility, Group, User};
use std::collections::{HashMap, HashSet};
use std::future::Future;

/// The common lookup surface both adapters satisfy.
///
/// "Not found" is always an empty/absent result, never an error; errors are
/// reserved for configuration, transport and protocol failures.
pub trait DataAdapter: Send + Sync {
    /// Try each candidate login against the given external-source id, in
    /// order, returning the first matching user. Exhausting the candidate
    /// list without a match yields `None`.
    fn find_user_by_external_logins(
        &self,
        idp_identifier: &str,
        login_candidates: &[String],
    ) -> impl Future<Output = BrokerResult<Option<User>>> + Send;

    /// Groups the user is a member of inside one virtual organization.
    fn groups_of_user_in_vo(
        &self,
        user_id: i64,
        vo_id: i64,
    ) -> impl Future<Output = BrokerResult<Vec<Group>>> + Send;

    /// Groups granted access to the facility.
    fn groups_assigned_to_facility(
        &self,
        facility_id: i64,
    ) -> impl Future<Output = BrokerResult<Vec<Group>>> + Send;

    /// Intersection of the user's groups with the facility's assigned
    /// groups, computed locally on group-id sets.
    ///
    /// Neither backend is assumed to perform the intersection server-side.
    /// The result is ordered by group id so identical backend state always
    /// yields identical output.
    fn users_groups_on_facility(
        &self,
        facility_id: i64,
        user_id: i64,
    ) -> impl Future<Output = BrokerResult<Vec<Group>>> + Send {
        async move {
            let assigned = self.groups_assigned_to_facility(facility_id).await?;
            if assigned.is_empty() {
                return Ok(Vec::new());
            }

            let mut vo_ids: Vec<i64> = assigned.iter().map(Group::vo_id).collect();
            vo_ids.sort_unstable();
            vo_ids.dedup();

            let mut member_group_ids = HashSet::new();
            for vo_id in vo_ids {
                for group in self.groups_of_user_in_vo(user_id, vo_id).await? {
                    member_group_ids.insert(group.id());
                }
            }

            let mut intersection: Vec<Group> = assigned
                .into_iter()
                .filter(|group| member_group_ids.contains(&group.id()))
                .collect();
            intersection.sort_by_key(Group::id);
            intersection.dedup_by_key(|group| group.id());
            Ok(intersection)
        }
    }

    /// Fetch the named attributes of one entity, keyed by internal
    /// identifier. Unknown identifiers are skipped with a warning; an
    /// attribute the backend has no value for is reported with its type's
    /// empty default.
    fn attribute_values(
        &self,
        entity: Entity,
        entity_id: i64,
        identifiers: &[String],
    ) -> impl Future<Output = BrokerResult<HashMap<String, AttributeValue>>> + Send;

    /// Facilities whose mapped attribute equals the given value.
    fn facilities_by_attribute(
        &self,
        identifier: &str,
        value: &str,
    ) -> impl Future<Output = BrokerResult<Vec<Facility>>> + Send;
}

/// A borrowed, selector-chosen adapter.
///
/// The two implementations are statically known; the selector returns this
/// closed variant instead of a boxed trait object so dispatch stays an
/// explicit match.
pub enum AdapterRef<'a, D: DirectoryConnector, R: RpcConnector> {
    Ldap(&'a LdapAdapter<D>),
    Rpc(&'a RpcAdapter<R>),
}

impl<D: DirectoryConnector, R: RpcConnector> Clone for AdapterRef<'_, D, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: DirectoryConnector, R: RpcConnector> Copy for AdapterRef<'_, D, R> {}

impl<D: DirectoryConnector, R: RpcConnector> AdapterRef<'_, D, R> {
    /// Backend name, for logging.
    pub fn backend(&self) -> &'static str {
        match self {
            AdapterRef::Ldap(_) => ldap::BACKEND,
            AdapterRef::Rpc(_) => rpc::BACKEND,
        }
    }
}

impl<D: DirectoryConnector, R: RpcConnector> DataAdapter for AdapterRef<'_, D, R> {
    fn find_user_by_external_logins(
        &self,
        idp_identifier: &str,
        login_candidates: &[String],
    ) -> impl Future<Output = BrokerResult<Option<User>>> + Send {
        async move {
            match self {
                AdapterRef::Ldap(adapter) => {
                    adapter
                        .find_user_by_external_logins(idp_identifier, login_candidates)
                        .await
                }
                AdapterRef::Rpc(adapter) => {
                    adapter
                        .find_user_by_external_logins(idp_identifier, login_candidates)
                        .await
                }
            }
        }
    }

    fn groups_of_user_in_vo(
        &self,
        user_id: i64,
        vo_id: i64,
    ) -> impl Future<Output = BrokerResult<Vec<Group>>> + Send {
        async move {
            match self {
                AdapterRef::Ldap(adapter) => adapter.groups_of_user_in_vo(user_id, vo_id).await,
                AdapterRef::Rpc(adapter) => adapter.groups_of_user_in_vo(user_id, vo_id).await,
            }
        }
    }

    fn groups_assigned_to_facility(
        &self,
        facility_id: i64,
    ) -> impl Future<Output = BrokerResult<Vec<Group>>> + Send {
        async move {
            match self {
                AdapterRef::Ldap(adapter) => adapter.groups_assigned_to_facility(facility_id).await,
                AdapterRef::Rpc(adapter) => adapter.groups_assigned_to_facility(facility_id).await,
            }
        }
    }

    fn attribute_values(
        &self,
        entity: Entity,
        entity_id: i64,
        identifiers: &[String],
    ) -> impl Future<Output = BrokerResult<HashMap<String, AttributeValue>>> + Send {
        async move {
            match self {
                AdapterRef::Ldap(adapter) => {
                    adapter.attribute_values(entity, entity_id, identifiers).await
                }
                AdapterRef::Rpc(adapter) => {
                    adapter.attribute_values(entity, entity_id, identifiers).await
                }
            }
        }
    }

    fn facilities_by_attribute(
        &self,
        identifier: &str,
        value: &str,
    ) -> impl Future<Output = BrokerResult<Vec<Facility>>> + Send {
        async move {
            match self {
                AdapterRef::Ldap(adapter) => {
                    adapter.facilities_by_attribute(identifier, value).await
                }
                AdapterRef::Rpc(adapter) => {
                    adapter.facilities_by_attribute(identifier, value).await
                }
            }
        }
    }
}

//! RPC/JSON-protocol data adapter.
//!
//! Request/response calls scoped by a manager namespace and method name,
//! parameters as a JSON object. This is the full-capability backend: besides
//! the common lookup surface it supports extended entity lookups and
//! attribute writes, exposed as inherent methods so the restricted directory
//! adapter never has to pretend it can serve them.
//!
//! A deployment may disable the RPC backend entirely; every operation then
//! answers with its "not found"/empty value without attempting a call.
//!
//! The backend reports application errors as JSON objects with an `errorId`
//! and an exception `name`. Which names mean "entity does not exist" (and
//! therefore map to an absent result instead of an error) varies between
//! backend versions, so the list is configurable data on the adapter, not
//! hard-coded logic.

pub mod mapper;

use crate::connectors::{ConnectorError, RpcConnector};
use crate::error::{BrokerError, BrokerResult};
use crate::mapping::AttributeMappingTable;
use crate::model::{AttributeValue, Entity, Facility, Group, Member, User, Vo};
use log::debug;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

use super::DataAdapter;

/// Backend name used in errors and logs.
pub const BACKEND: &str = "rpc";

/// Exception names that mean "entity does not exist" on stock backend
/// versions. Override with [`RpcAdapter::with_not_exists_errors`] when the
/// deployed backend uses different names.
pub const DEFAULT_NOT_EXISTS_ERRORS: &[&str] = &[
    "UserNotExistsException",
    "UserExtSourceNotExistsException",
    "MemberNotExistsException",
    "GroupNotExistsException",
    "FacilityNotExistsException",
    "VoNotExistsException",
    "ResourceNotExistsException",
    "AttributeNotExistsException",
];

/// The RPC-backed, full-capability adapter.
pub struct RpcAdapter<C> {
    connector: C,
    table: Arc<AttributeMappingTable>,
    not_exists_errors: Vec<String>,
}

impl<C: RpcConnector> RpcAdapter<C> {
    pub fn new(connector: C, table: Arc<AttributeMappingTable>) -> Self {
        Self {
            connector,
            table,
            not_exists_errors: DEFAULT_NOT_EXISTS_ERRORS
                .iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }

    /// Replace the set of backend exception names treated as "not found".
    pub fn with_not_exists_errors(mut self, names: Vec<String>) -> Self {
        self.not_exists_errors = names;
        self
    }

    /// Invoke one backend method.
    ///
    /// `Ok(None)` means "not found" — either the backend is disabled, or it
    /// reported an exception from the configured not-exists set. Other
    /// reported exceptions are protocol errors.
    async fn call(
        &self,
        manager: &str,
        method: &str,
        params: Value,
    ) -> BrokerResult<Option<Value>> {
        if !self.connector.enabled() {
            debug!("rpc backend disabled, {manager}.{method} answered as not found");
            return Ok(None);
        }
        let response = self
            .connector
            .call(manager, method, params)
            .await
            .map_err(|err| match err {
                ConnectorError::Connection(source) => BrokerError::BackendConnection {
                    backend: BACKEND,
                    source,
                },
                ConnectorError::Protocol(message) => BrokerError::protocol(BACKEND, message),
            })?;

        if let Some(object) = response.as_object() {
            if object.contains_key("errorId") {
                let name = object
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                if self.not_exists_errors.iter().any(|known| known == name) {
                    return Ok(None);
                }
                let message = object
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                return Err(BrokerError::protocol(
                    BACKEND,
                    format!("{manager}.{method} failed with {name}: {message}"),
                ));
            }
        }
        Ok(Some(response))
    }

    /// Resolve the short names of the given VOs, keyed by id.
    async fn vo_short_names(&self, vo_ids: &[i64]) -> BrokerResult<HashMap<i64, String>> {
        let mut short_names = HashMap::with_capacity(vo_ids.len());
        for vo_id in vo_ids {
            if let Some(vo) = self.vo_by_id(*vo_id).await? {
                short_names.insert(*vo_id, vo.short_name().to_string());
            }
        }
        Ok(short_names)
    }

    // ---- Extended lookup surface (full-capability backend only) ----

    pub async fn user_by_id(&self, user_id: i64) -> BrokerResult<Option<User>> {
        match self
            .call("usersManager", "getUserById", json!({"id": user_id}))
            .await?
        {
            Some(value) => mapper::map_user(&value),
            None => Ok(None),
        }
    }

    pub async fn vo_by_id(&self, vo_id: i64) -> BrokerResult<Option<Vo>> {
        match self
            .call("vosManager", "getVoById", json!({"id": vo_id}))
            .await?
        {
            Some(value) => mapper::map_vo(&value),
            None => Ok(None),
        }
    }

    pub async fn vo_by_short_name(&self, short_name: &str) -> BrokerResult<Option<Vo>> {
        match self
            .call(
                "vosManager",
                "getVoByShortName",
                json!({"shortName": short_name}),
            )
            .await?
        {
            Some(value) => mapper::map_vo(&value),
            None => Ok(None),
        }
    }

    pub async fn member_by_user_and_vo(
        &self,
        user_id: i64,
        vo_id: i64,
    ) -> BrokerResult<Option<Member>> {
        match self
            .call(
                "membersManager",
                "getMemberByUser",
                json!({"vo": vo_id, "user": user_id}),
            )
            .await?
        {
            Some(value) => mapper::map_member(&value),
            None => Ok(None),
        }
    }

    /// Users whose mapped attribute equals the given value.
    pub async fn users_by_attribute_value(
        &self,
        identifier: &str,
        value: &str,
    ) -> BrokerResult<Vec<User>> {
        let mapping = self.table.resolve(identifier)?;
        let Some(rpc_name) = mapping.rpc_name.as_deref() else {
            return Err(BrokerError::configuration(format!(
                "attribute '{identifier}' has no rpc name configured"
            )));
        };
        let Some(response) = self
            .call(
                "usersManager",
                "getUsersByAttributeValue",
                json!({"attributeName": rpc_name, "attributeValue": value}),
            )
            .await?
        else {
            return Ok(Vec::new());
        };
        let items = response.as_array().ok_or_else(|| {
            BrokerError::protocol(BACKEND, format!("users: expected array, got {response}"))
        })?;
        let mut users = Vec::with_capacity(items.len());
        for item in items {
            if let Some(user) = mapper::map_user(item)? {
                users.push(user);
            }
        }
        Ok(users)
    }

    /// Write one attribute value; the boolean reports whether the write was
    /// actually performed (a disabled backend answers `false`).
    pub async fn set_attribute(
        &self,
        entity: Entity,
        entity_id: i64,
        identifier: &str,
        value: &AttributeValue,
    ) -> BrokerResult<bool> {
        let mapping = self.table.resolve(identifier)?;
        let Some(rpc_name) = mapping.rpc_name.as_deref() else {
            return Err(BrokerError::configuration(format!(
                "attribute '{identifier}' has no rpc name configured"
            )));
        };
        let params = json!({
            entity.as_str(): entity_id,
            "attribute": {"name": rpc_name, "value": serde_json::to_value(value)?},
        });
        let response = self
            .call("attributesManager", "setAttribute", params)
            .await?;
        Ok(response.is_some())
    }
}

impl<C: RpcConnector> DataAdapter for RpcAdapter<C> {
    fn find_user_by_external_logins(
        &self,
        idp_identifier: &str,
        login_candidates: &[String],
    ) -> impl std::future::Future<Output = BrokerResult<Option<User>>> + Send {
        async move {
            for candidate in login_candidates {
                let response = self
                    .call(
                        "usersManager",
                        "getUserByExtSourceNameAndExtLogin",
                        json!({"extSourceName": idp_identifier, "extLogin": candidate}),
                    )
                    .await?;
                if let Some(value) = response {
                    if let Some(user) = mapper::map_user(&value)? {
                        return Ok(Some(user));
                    }
                }
            }
            Ok(None)
        }
    }

    /// Membership-manager strategy: resolve the user's member record in the
    /// VO, then list that member's groups.
    fn groups_of_user_in_vo(
        &self,
        user_id: i64,
        vo_id: i64,
    ) -> impl std::future::Future<Output = BrokerResult<Vec<Group>>> + Send {
        async move {
            let Some(member) = self.member_by_user_and_vo(user_id, vo_id).await? else {
                return Ok(Vec::new());
            };
            let Some(response) = self
                .call(
                    "groupsManager",
                    "getMemberGroups",
                    json!({"member": member.id()}),
                )
                .await?
            else {
                return Ok(Vec::new());
            };
            let short_names = self.vo_short_names(&[vo_id]).await?;
            mapper::map_groups(&response, &short_names)
        }
    }

    fn groups_assigned_to_facility(
        &self,
        facility_id: i64,
    ) -> impl std::future::Future<Output = BrokerResult<Vec<Group>>> + Send {
        async move {
            let Some(response) = self
                .call(
                    "facilitiesManager",
                    "getAssignedGroups",
                    json!({"facility": facility_id}),
                )
                .await?
            else {
                return Ok(Vec::new());
            };

            // Assigned groups may span VOs; resolve every short name once.
            let mut vo_ids: Vec<i64> = response
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|item| item.get("voId").and_then(Value::as_i64))
                        .collect()
                })
                .unwrap_or_default();
            vo_ids.sort_unstable();
            vo_ids.dedup();

            let short_names = self.vo_short_names(&vo_ids).await?;
            mapper::map_groups(&response, &short_names)
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
            let rpc_names: Vec<&str> = mappings
                .iter()
                .filter_map(|m| m.rpc_name.as_deref())
                .collect();
            let response = if rpc_names.is_empty() {
                None
            } else {
                self.call(
                    "attributesManager",
                    "getAttributes",
                    json!({entity.as_str(): entity_id, "attrNames": rpc_names}),
                )
                .await?
            };
            mapper::map_attributes(&response.unwrap_or(Value::Null), &mappings, &self.table)
        }
    }

    fn facilities_by_attribute(
        &self,
        identifier: &str,
        value: &str,
    ) -> impl std::future::Future<Output = BrokerResult<Vec<Facility>>> + Send {
        async move {
            let mapping = self.table.resolve(identifier)?;
            let Some(rpc_name) = mapping.rpc_name.as_deref() else {
                return Err(BrokerError::configuration(format!(
                    "attribute '{identifier}' has no rpc name configured"
                )));
            };
            let Some(response) = self
                .call(
                    "facilitiesManager",
                    "getFacilitiesByAttribute",
                    json!({"attributeName": rpc_name, "attributeValue": value}),
                )
                .await?
            else {
                return Ok(Vec::new());
            };
            let items = response.as_array().ok_or_else(|| {
                BrokerError::protocol(
                    BACKEND,
                    format!("facilities: expected array, got {response}"),
                )
            })?;
            let mut facilities = Vec::with_capacity(items.len());
            for item in items {
                if let Some(facility) = mapper::map_facility(item)? {
                    facilities.push(facility);
                }
            }
            Ok(facilities)
        }
    }
}

//! Shared backend fixtures.
//!
//! One registry scenario expressed twice — once as directory entries, once
//! as RPC routes — so both adapters can be tested against the same logical
//! state:
//!
//! - VO 7 `vo1`
//! - user 10 (member 33, VALID in VO 7), external login `jnovakova@idp.example.org`
//! - groups 100 `members`, 101 `admins`, 103 `staff` contain the user;
//!   group 102 `guests` does not
//! - facility 50 has groups 100, 101 and 102 assigned, facility 51 has none
//! - forwarded entitlement `x:1#a` on the user, capability `cap1` on the
//!   facility, capability `res:read` on group 101

use super::{MockDirectory, MockRpc};
use idbroker::{
    AttributeMappingTable, DirectoryEntry, DirectoryLayout, LdapAdapter, OperationPreferences,
    RpcAdapter,
};
use serde_json::{Value, json};
use std::sync::Arc;

pub const ROOT: &str = "dc=example,dc=org";
pub const IDP: &str = "idp.example.org";

pub fn layout() -> DirectoryLayout {
    DirectoryLayout::under(ROOT)
}

pub fn user_dn(user_id: i64) -> String {
    format!("userId={user_id},ou=users,{ROOT}")
}

/// The attribute mapping table both adapters share.
pub fn mapping_table() -> Arc<AttributeMappingTable> {
    let json = r#"[
        {"identifier": "forwardedEntitlements", "ldapName": "eduPersonEntitlement",
         "rpcName": "urn:attr:def:forwardedEntitlements", "type": "array"},
        {"identifier": "facilityCapabilities", "ldapName": "capabilities",
         "rpcName": "urn:attr:def:capabilities", "type": "array"},
        {"identifier": "resourceCapabilities", "ldapName": "resourceCapabilities",
         "rpcName": "urn:attr:def:resourceCapabilities", "type": "array"},
        {"identifier": "email", "ldapName": "mail",
         "rpcName": "urn:attr:def:mail", "type": "string"},
        {"identifier": "loa", "ldapName": "loa",
         "rpcName": "urn:attr:def:loa", "type": "integer"},
        {"identifier": "entityId", "ldapName": "entityId",
         "rpcName": "urn:attr:def:entityId", "type": "string"}
    ]"#;
    Arc::new(AttributeMappingTable::from_reader(json.as_bytes()))
}

pub fn preferences(json: &str) -> OperationPreferences {
    OperationPreferences::from_reader(json.as_bytes())
}

pub fn ldap_adapter(connector: MockDirectory) -> LdapAdapter<MockDirectory> {
    super::init_logging();
    LdapAdapter::new(connector, layout(), mapping_table())
}

pub fn rpc_adapter(connector: MockRpc) -> RpcAdapter<MockRpc> {
    super::init_logging();
    RpcAdapter::new(connector, mapping_table())
}

fn group_entry(id: i64, name: &str, members: &[i64]) -> DirectoryEntry {
    let mut entry = DirectoryEntry::new(format!("groupId={id},ou=groups,{ROOT}"))
        .with_attribute("groupId", vec![id.to_string()])
        .with_attribute("cn", vec![name.to_string()])
        .with_attribute("uniqueGroupName", vec![format!("vo1:{name}")])
        .with_attribute("voId", vec!["7".to_string()]);
    if !members.is_empty() {
        entry = entry.with_attribute(
            "uniqueMember",
            members.iter().map(|id| user_dn(*id)).collect::<Vec<_>>(),
        );
    }
    entry
}

/// The scenario as directory entries.
pub fn directory_scenario() -> MockDirectory {
    let layout = layout();
    let user = DirectoryEntry::new(user_dn(10))
        .with_attribute("userId", vec!["10"])
        .with_attribute("givenName", vec!["Jana"])
        .with_attribute("sn", vec!["Novakova"])
        .with_attribute("login", vec!["jnovakova"])
        .with_attribute("eduPersonPrincipalNames", vec![format!("jnovakova@{IDP}")])
        .with_attribute("eduPersonEntitlement", vec!["x:1#a"])
        .with_attribute("mail", vec!["jana@example.org"])
        .with_attribute("loa", vec!["2"]);

    let facility = DirectoryEntry::new(format!("facilityId=50,ou=facilities,{ROOT}"))
        .with_attribute("facilityId", vec!["50"])
        .with_attribute("cn", vec!["test-service"])
        .with_attribute("entityId", vec!["https://sp.example.org"])
        .with_attribute("assignedGroupId", vec!["100", "101", "102"])
        .with_attribute("capabilities", vec!["cap1"]);
    let empty_facility = DirectoryEntry::new(format!("facilityId=51,ou=facilities,{ROOT}"))
        .with_attribute("facilityId", vec!["51"])
        .with_attribute("cn", vec!["empty-service"]);

    let vo = DirectoryEntry::new(format!("voId=7,ou=vos,{ROOT}"))
        .with_attribute("voId", vec!["7"])
        .with_attribute("o", vec!["vo1"])
        .with_attribute("description", vec!["VO One"]);

    MockDirectory::new()
        .with_entry(&layout.user_base, user)
        .with_entry(&layout.group_base, group_entry(100, "members", &[10]))
        .with_entry(
            &layout.group_base,
            group_entry(101, "admins", &[10])
                .with_attribute("resourceCapabilities", vec!["res:read"]),
        )
        .with_entry(&layout.group_base, group_entry(102, "guests", &[]))
        .with_entry(&layout.group_base, group_entry(103, "staff", &[10]))
        .with_entry(&layout.facility_base, facility)
        .with_entry(&layout.facility_base, empty_facility)
        .with_entry(&layout.vo_base, vo)
}

pub fn user_json() -> Value {
    json!({"id": 10, "firstName": "Jana", "lastName": "Novakova"})
}

fn group_json(id: i64, name: &str) -> Value {
    json!({"id": id, "name": name, "voId": 7})
}

/// The scenario as RPC routes.
pub fn rpc_scenario() -> MockRpc {
    MockRpc::new()
        .route(
            "usersManager",
            "getUserByExtSourceNameAndExtLogin",
            json!({"extSourceName": IDP, "extLogin": "jnovakova"}),
            user_json(),
        )
        .route(
            "membersManager",
            "getMemberByUser",
            json!({"vo": 7, "user": 10}),
            json!({"id": 33, "userId": 10, "voId": 7, "status": "VALID"}),
        )
        .route(
            "groupsManager",
            "getMemberGroups",
            json!({"member": 33}),
            json!([
                group_json(100, "members"),
                group_json(101, "admins"),
                group_json(103, "staff"),
            ]),
        )
        .route(
            "vosManager",
            "getVoById",
            json!({"id": 7}),
            json!({"id": 7, "name": "VO One", "shortName": "vo1"}),
        )
        .route(
            "facilitiesManager",
            "getAssignedGroups",
            json!({"facility": 50}),
            json!([
                group_json(100, "members"),
                group_json(101, "admins"),
                group_json(102, "guests"),
            ]),
        )
        .route(
            "facilitiesManager",
            "getAssignedGroups",
            json!({"facility": 51}),
            json!([]),
        )
        .route(
            "attributesManager",
            "getAttributes",
            json!({"user": 10}),
            json!([
                {"name": "urn:attr:def:forwardedEntitlements", "value": ["x:1#a"]},
                {"name": "urn:attr:def:mail", "value": "jana@example.org"},
                {"name": "urn:attr:def:loa", "value": 2},
            ]),
        )
        .route(
            "attributesManager",
            "getAttributes",
            json!({"facility": 50}),
            json!([{"name": "urn:attr:def:capabilities", "value": ["cap1"]}]),
        )
        .route(
            "attributesManager",
            "getAttributes",
            json!({"group": 101}),
            json!([{"name": "urn:attr:def:resourceCapabilities", "value": ["res:read"]}]),
        )
        .route(
            "facilitiesManager",
            "getFacilitiesByAttribute",
            json!({"attributeName": "urn:attr:def:entityId", "attributeValue": "https://sp.example.org"}),
            json!([{"id": 50, "name": "test-service", "description": ""}]),
        )
}

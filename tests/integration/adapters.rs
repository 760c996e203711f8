//! Data adapter and selector behavior over both backends.

use crate::common::{MockDirectory, MockRpc, fixtures};
use idbroker::{
    ADAPTER_RPC, AdapterSelector, AttributeValue, BrokerError, DataAdapter, DirectoryEntry, Entity,
    Group, MemberStatus,
};
use serde_json::json;

fn group_ids(groups: &[Group]) -> Vec<i64> {
    groups.iter().map(Group::id).collect()
}

// ---- directory adapter ----

#[tokio::test]
async fn ldap_users_groups_on_facility_is_the_id_intersection() {
    let adapter = fixtures::ldap_adapter(fixtures::directory_scenario());
    let groups = adapter.users_groups_on_facility(50, 10).await.unwrap();
    // Group 102 is assigned but the user is no member; group 103 holds the
    // user but is not assigned. Output is ordered by group id.
    assert_eq!(group_ids(&groups), vec![100, 101]);
}

#[tokio::test]
async fn ldap_empty_intersection_is_a_value_not_an_error() {
    let adapter = fixtures::ldap_adapter(fixtures::directory_scenario());
    assert!(adapter.users_groups_on_facility(51, 10).await.unwrap().is_empty());
    // Unknown facility behaves the same way.
    assert!(adapter.users_groups_on_facility(99, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn ldap_find_user_tries_candidates_in_order() {
    let adapter = fixtures::ldap_adapter(fixtures::directory_scenario());
    let candidates = vec![
        "nobody@elsewhere.org".to_string(),
        format!("jnovakova@{}", fixtures::IDP),
    ];
    let user = adapter
        .find_user_by_external_logins(fixtures::IDP, &candidates)
        .await
        .unwrap()
        .expect("second candidate matches");
    assert_eq!(user.id(), 10);
    assert_eq!(user.last_name(), "Novakova");

    let exhausted = adapter
        .find_user_by_external_logins(fixtures::IDP, &["nobody@elsewhere.org".to_string()])
        .await
        .unwrap();
    assert!(exhausted.is_none());
}

#[tokio::test]
async fn ldap_attribute_batch_skips_unknown_identifiers() {
    let adapter = fixtures::ldap_adapter(fixtures::directory_scenario());
    let identifiers = vec![
        "email".to_string(),
        "loa".to_string(),
        "notConfigured".to_string(),
    ];
    let values = adapter
        .attribute_values(Entity::User, 10, &identifiers)
        .await
        .unwrap();
    assert_eq!(values.len(), 2);
    assert_eq!(
        values.get("email"),
        Some(&AttributeValue::String("jana@example.org".to_string()))
    );
    assert_eq!(values.get("loa"), Some(&AttributeValue::Integer(2)));
}

#[tokio::test]
async fn ldap_inconvertible_value_degrades_to_null_within_batch() {
    let layout = fixtures::layout();
    let directory = MockDirectory::new().with_entry(
        &layout.user_base,
        DirectoryEntry::new(fixtures::user_dn(10))
            .with_attribute("userId", vec!["10"])
            .with_attribute("sn", vec!["Novakova"])
            .with_attribute("mail", vec!["jana@example.org"])
            .with_attribute("loa", vec!["very-high"]),
    );
    let adapter = fixtures::ldap_adapter(directory);
    let values = adapter
        .attribute_values(Entity::User, 10, &["email".to_string(), "loa".to_string()])
        .await
        .unwrap();
    assert_eq!(values.get("loa"), Some(&AttributeValue::Null));
    assert_eq!(
        values.get("email"),
        Some(&AttributeValue::String("jana@example.org".to_string()))
    );
}

#[tokio::test]
async fn ldap_member_attributes_are_an_explicit_limitation() {
    let adapter = fixtures::ldap_adapter(fixtures::directory_scenario());
    let err = adapter
        .attribute_values(Entity::Member, 33, &["email".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::Configuration { .. }));
}

#[tokio::test]
async fn ldap_facilities_by_attribute_matches_on_mapped_name() {
    let adapter = fixtures::ldap_adapter(fixtures::directory_scenario());
    let facilities = adapter
        .facilities_by_attribute("entityId", "https://sp.example.org")
        .await
        .unwrap();
    assert_eq!(facilities.len(), 1);
    assert_eq!(facilities[0].id(), 50);
    assert!(
        adapter
            .facilities_by_attribute("entityId", "https://unknown.example.org")
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn ldap_transport_failure_is_retryable_connection_error() {
    let adapter = fixtures::ldap_adapter(MockDirectory::failing());
    let err = adapter.groups_assigned_to_facility(50).await.unwrap_err();
    assert!(matches!(err, BrokerError::BackendConnection { .. }));
    assert!(err.is_retryable());
}

// ---- rpc adapter ----

#[tokio::test]
async fn rpc_users_groups_on_facility_matches_the_directory_answer() {
    let adapter = fixtures::rpc_adapter(fixtures::rpc_scenario());
    let groups = adapter.users_groups_on_facility(50, 10).await.unwrap();
    assert_eq!(group_ids(&groups), vec![100, 101]);
    // Unique names are composed from the owning VO's short name.
    assert_eq!(groups[0].unique_name(), Some("vo1:members"));
    assert_eq!(groups[1].unique_name(), Some("vo1:admins"));
}

#[tokio::test]
async fn rpc_find_user_skips_unknown_candidates() {
    let adapter = fixtures::rpc_adapter(fixtures::rpc_scenario());
    let candidates = vec!["old-login".to_string(), "jnovakova".to_string()];
    let user = adapter
        .find_user_by_external_logins(fixtures::IDP, &candidates)
        .await
        .unwrap()
        .expect("second candidate matches");
    assert_eq!(user.id(), 10);
}

#[tokio::test]
async fn rpc_not_exists_exception_means_not_found() {
    let connector = MockRpc::new().route(
        "usersManager",
        "getUserByExtSourceNameAndExtLogin",
        json!({"extLogin": "ghost"}),
        json!({"errorId": "x1", "name": "UserExtSourceNotExistsException",
               "message": "no such user ext source"}),
    );
    let adapter = fixtures::rpc_adapter(connector);
    let user = adapter
        .find_user_by_external_logins(fixtures::IDP, &["ghost".to_string()])
        .await
        .unwrap();
    assert!(user.is_none());
}

#[tokio::test]
async fn rpc_unknown_exception_is_a_protocol_error() {
    let connector = MockRpc::new().route(
        "membersManager",
        "getMemberByUser",
        json!({"user": 10}),
        json!({"errorId": "x2", "name": "InternalErrorException", "message": "boom"}),
    );
    let adapter = fixtures::rpc_adapter(connector);
    let err = adapter.groups_of_user_in_vo(10, 7).await.unwrap_err();
    assert!(matches!(err, BrokerError::BackendProtocol { .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn rpc_custom_not_exists_list_overrides_the_default() {
    let connector = MockRpc::new().route(
        "membersManager",
        "getMemberByUser",
        json!({"user": 10}),
        json!({"errorId": "x3", "name": "LegacyMemberGoneException", "message": ""}),
    );
    let adapter = fixtures::rpc_adapter(connector)
        .with_not_exists_errors(vec!["LegacyMemberGoneException".to_string()]);
    // The legacy name now maps to "no member", which yields no groups.
    assert!(adapter.groups_of_user_in_vo(10, 7).await.unwrap().is_empty());
}

#[tokio::test]
async fn disabled_rpc_backend_answers_everything_as_empty() {
    let adapter = fixtures::rpc_adapter(MockRpc::disabled());

    let user = adapter
        .find_user_by_external_logins(fixtures::IDP, &["jnovakova".to_string()])
        .await
        .unwrap();
    assert!(user.is_none());

    assert!(adapter.users_groups_on_facility(50, 10).await.unwrap().is_empty());

    let values = adapter
        .attribute_values(Entity::User, 10, &["email".to_string(), "forwardedEntitlements".to_string()])
        .await
        .unwrap();
    assert_eq!(values.get("email"), Some(&AttributeValue::Null));
    assert_eq!(
        values.get("forwardedEntitlements"),
        Some(&AttributeValue::Array(vec![]))
    );

    let written = adapter
        .set_attribute(
            Entity::User,
            10,
            "email",
            &AttributeValue::String("new@example.org".to_string()),
        )
        .await
        .unwrap();
    assert!(!written);
}

#[tokio::test]
async fn rpc_set_attribute_reports_success() {
    let connector = MockRpc::new().route(
        "attributesManager",
        "setAttribute",
        json!({"user": 10}),
        serde_json::Value::Null,
    );
    let adapter = fixtures::rpc_adapter(connector);
    let written = adapter
        .set_attribute(
            Entity::User,
            10,
            "email",
            &AttributeValue::String("new@example.org".to_string()),
        )
        .await
        .unwrap();
    assert!(written);
}

#[tokio::test]
async fn rpc_member_lookup_carries_status() {
    let adapter = fixtures::rpc_adapter(fixtures::rpc_scenario());
    let member = adapter
        .member_by_user_and_vo(10, 7)
        .await
        .unwrap()
        .expect("member exists");
    assert_eq!(member.id(), 33);
    assert_eq!(member.status(), MemberStatus::Valid);
}

#[tokio::test]
async fn rpc_transport_failure_is_retryable_connection_error() {
    let adapter = fixtures::rpc_adapter(MockRpc::failing());
    let err = adapter.groups_assigned_to_facility(50).await.unwrap_err();
    assert!(matches!(err, BrokerError::BackendConnection { .. }));
    assert!(err.is_retryable());
}

// ---- selector ----

fn selector(preferences_json: &str) -> AdapterSelector<MockDirectory, MockRpc> {
    AdapterSelector::new(
        fixtures::rpc_adapter(fixtures::rpc_scenario()),
        Some(fixtures::ldap_adapter(fixtures::directory_scenario())),
        fixtures::preferences(preferences_json),
    )
}

#[tokio::test]
async fn selector_honors_per_operation_preference() {
    let selector = selector(r#"[{"operation": "get_user_entitlements", "adapter": "ldap"}]"#);
    assert_eq!(selector.select("get_user_entitlements").backend(), "ldap");
    // Unconfigured operations default to the full-capability backend.
    assert_eq!(selector.select("find_user").backend(), "rpc");
}

#[tokio::test]
async fn selector_falls_back_to_rpc_for_unknown_adapter_names() {
    let selector = selector(r#"[{"operation": "get_user_entitlements", "adapter": "graphql"}]"#);
    assert_eq!(selector.select("get_user_entitlements").backend(), ADAPTER_RPC);
}

#[tokio::test]
async fn selector_falls_back_when_directory_adapter_is_absent() {
    let selector: AdapterSelector<MockDirectory, MockRpc> = AdapterSelector::new(
        fixtures::rpc_adapter(fixtures::rpc_scenario()),
        None,
        fixtures::preferences(r#"[{"operation": "get_user_entitlements", "adapter": "ldap"}]"#),
    );
    assert_eq!(selector.select("get_user_entitlements").backend(), "rpc");
}

#[tokio::test]
async fn selected_adapters_answer_the_same_logical_query() {
    let selector = selector(r#"[{"operation": "get_user_entitlements", "adapter": "ldap"}]"#);
    let via_ldap = selector
        .select("get_user_entitlements")
        .users_groups_on_facility(50, 10)
        .await
        .unwrap();
    let via_rpc = selector
        .select("anything_else")
        .users_groups_on_facility(50, 10)
        .await
        .unwrap();
    assert_eq!(group_ids(&via_ldap), group_ids(&via_rpc));
}

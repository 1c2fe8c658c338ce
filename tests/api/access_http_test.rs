//! Access checks and default assignments on the negotiated domain

use super::*;
use multisite_core::api::access::AccessCheckResponse;
use multisite_core::api::SuccessResponse;
use multisite_core::domain::AccessAssignment;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{json, Value};
use std::collections::BTreeSet;

fn ids(values: &[&str]) -> BTreeSet<DomainId> {
    values.iter().map(|v| DomainId::from(*v)).collect()
}

#[rstest]
#[case::shared_domain(&["one_example_com"], &["example_com", "one_example_com"], false, true)]
#[case::disjoint(&["one_example_com"], &["two_example_com"], false, false)]
#[case::all_domains_flag(&["two_example_com"], &[], true, true)]
#[case::all_domains_flag_needs_item_domains(&[], &["example_com"], true, false)]
#[case::nothing_assigned(&[], &[], false, false)]
#[tokio::test]
async fn test_access_check_over_http(
    #[case] item_domains: &[&str],
    #[case] account_domains: &[&str],
    #[case] all_domains: bool,
    #[case] expected: bool,
) {
    let state = test_state(&[]);
    seed_domains(&state).await;

    let (status, body): (_, Option<SuccessResponse<AccessCheckResponse>>) = post_json(
        &app(&state),
        "/api/v1/access/check",
        &json!({
            "item": {"id": "10", "assignment": {"domain_ids": item_domains}},
            "account": {
                "id": "3",
                "assignment": {"domain_ids": account_domains, "all_domains": all_domains}
            }
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let response = body.unwrap().data;
    assert_eq!(response.allowed, expected);
    assert_eq!(response.account_all_domains, all_domains);
    assert_eq!(response.active_domain, DomainId::from("example_com"));
}

#[tokio::test]
async fn test_access_check_drops_deleted_domains() {
    let state = test_state(&[]);
    seed_domains(&state).await;
    state
        .registry
        .delete(&DomainId::from("two_example_com"))
        .await
        .unwrap();

    let (status, body): (_, Option<SuccessResponse<AccessCheckResponse>>) = post_json(
        &app(&state),
        "/api/v1/access/check",
        &json!({
            "item": {"id": "10", "assignment": {"domain_ids": ["one_example_com", "two_example_com"]}},
            "account": {"id": "3", "assignment": {"domain_ids": ["two_example_com"]}}
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let response = body.unwrap().data;
    assert!(!response.allowed);
    assert_eq!(response.item_domains, ids(&["one_example_com"]));
    assert!(response.account_domains.is_empty());
}

#[tokio::test]
async fn test_access_check_uses_request_account_by_default() {
    let state = test_state(&[]);
    seed_domains(&state).await;
    let member = Account::new("8").with_assignment(AccessAssignment::new(["two_example_com"]));

    let (status, body): (_, Option<SuccessResponse<AccessCheckResponse>>) = post_json_on(
        &app_as(&state, member),
        "two.example.com",
        "/api/v1/access/check",
        &json!({"item": {"id": "10", "assignment": {"domain_ids": ["two_example_com"]}}}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let response = body.unwrap().data;
    assert!(response.allowed);
    assert_eq!(response.active_domain, DomainId::from("two_example_com"));
}

#[tokio::test]
async fn test_access_check_on_inactive_domain_redirects() {
    let state = test_state(&[]);
    seed_domains(&state).await;
    disable(&state, "one_example_com").await;

    let (status, _): (_, Option<Value>) = post_json_on(
        &app(&state),
        "one.example.com",
        "/api/v1/access/check",
        &json!({"item": {"id": "10"}}),
    )
    .await;

    assert_eq!(status, StatusCode::FOUND);
}

#[rstest]
#[case::content("node", &["one_example_com"])]
#[case::account("user", &["one_example_com"])]
#[case::unregistered_kind("comment", &[])]
#[tokio::test]
async fn test_default_assignment_seeds_active_domain(
    #[case] kind: &str,
    #[case] expected: &[&str],
) {
    let state = test_state(&[]);
    seed_domains(&state).await;

    let (status, body): (_, Option<SuccessResponse<AccessAssignment>>) = post_json_on(
        &app(&state),
        "one.example.com",
        "/api/v1/access/default-assignment",
        &json!({"kind": kind}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let assignment = body.unwrap().data;
    assert_eq!(assignment.domain_ids, ids(expected));
    assert!(!assignment.all_domains);
}

//! Domain negotiation and the inactive-domain redirect

use super::*;
use multisite_core::api::site::ActiveDomainResponse;
use multisite_core::api::SuccessResponse;
use multisite_core::policy::ACCESS_INACTIVE_DOMAINS;
use pretty_assertions::assert_eq;
use serde_json::Value;

#[tokio::test]
async fn test_exact_host_selects_domain() {
    let state = test_state(&[]);
    seed_domains(&state).await;

    let (status, body): (_, Option<SuccessResponse<ActiveDomainResponse>>) =
        get_json_on(&app(&state), "ONE.example.com", "/").await;

    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap().data;
    assert_eq!(body.domain.id, DomainId::from("one_example_com"));
    assert_eq!(body.path, "http://one.example.com/");
}

#[tokio::test]
async fn test_unknown_host_falls_back_to_default() {
    let state = test_state(&[]);
    seed_domains(&state).await;
    let app = app(&state);

    for host in ["unknown.test", "sub.one.example.com", "localhost:8080"] {
        let (status, body): (_, Option<SuccessResponse<ActiveDomainResponse>>) =
            get_json_on(&app, host, "/").await;
        assert_eq!(status, StatusCode::OK, "host {}", host);
        assert_eq!(body.unwrap().data.domain.id, DomainId::from("example_com"));
    }
}

#[tokio::test]
async fn test_empty_registry_is_configuration_error() {
    let state = test_state(&[]);

    let (status, body): (_, Option<Value>) = get_json_on(&app(&state), "example.com", "/").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body.unwrap()["error"], "configuration_error");
}

#[tokio::test]
async fn test_admin_routes_work_on_empty_registry() {
    let state = test_state(&[]);

    let (status, body): (_, Option<SuccessResponse<Vec<Value>>>) =
        get_json(&app(&state), "/api/v1/domains").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.unwrap().data.is_empty());
}

#[tokio::test]
async fn test_inactive_domain_redirects_to_default() {
    let state = test_state(&[]);
    seed_domains(&state).await;
    disable(&state, "one_example_com").await;

    let response = get_raw_on(&app(&state), "one.example.com", "/").await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "http://example.com/"
    );
}

#[tokio::test]
async fn test_inactive_domain_served_once_permission_granted() {
    let repo = Arc::new(InMemoryDomainRepository::new());
    let state = AppState::new(
        Config::default(),
        repo.clone(),
        Arc::new(RolePermissionChecker::default()),
    );
    seed_domains(&state).await;
    disable(&state, "one_example_com").await;

    let response = get_raw_on(&app(&state), "one.example.com", "/").await;
    assert_eq!(response.status(), StatusCode::FOUND);

    // Same storage, anonymous visitors now hold the override
    let permissive = AppState::new(
        Config::default(),
        repo,
        Arc::new(RolePermissionChecker::new([ACCESS_INACTIVE_DOMAINS])),
    );
    let (status, body): (_, Option<SuccessResponse<ActiveDomainResponse>>) =
        get_json_on(&build_router(permissive), "one.example.com", "/").await;

    assert_eq!(status, StatusCode::OK);
    let domain = body.unwrap().data.domain;
    assert_eq!(domain.id, DomainId::from("one_example_com"));
    assert_eq!(domain.status, DomainStatus::Inactive);
}

#[tokio::test]
async fn test_account_permission_overrides_inactive_domain() {
    let state = test_state(&[]);
    seed_domains(&state).await;
    disable(&state, "two_example_com").await;

    let editor = Account::new("5").with_permission(ACCESS_INACTIVE_DOMAINS);
    let (status, body): (_, Option<SuccessResponse<ActiveDomainResponse>>) =
        get_json_on(&app_as(&state, editor), "two.example.com", "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap().data.domain.id, DomainId::from("two_example_com"));

    let visitor = Account::new("6");
    let response = get_raw_on(&app_as(&state, visitor), "two.example.com", "/").await;
    assert_eq!(response.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn test_default_change_retargets_redirect() {
    let state = test_state(&[]);
    seed_domains(&state).await;
    disable(&state, "one_example_com").await;
    state
        .registry
        .set_default(&DomainId::from("two_example_com"))
        .await
        .unwrap();

    let response = get_raw_on(&app(&state), "one.example.com", "/").await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "http://two.example.com/"
    );
}

#[tokio::test]
async fn test_reactivated_domain_is_served() {
    let state = test_state(&[]);
    seed_domains(&state).await;
    disable(&state, "one_example_com").await;
    state
        .registry
        .set_status(&DomainId::from("one_example_com"), DomainStatus::Active)
        .await
        .unwrap();

    let response = get_raw_on(&app(&state), "one.example.com", "/").await;
    assert_eq!(response.status(), StatusCode::OK);
}

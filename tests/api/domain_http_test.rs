//! Registry administration endpoints

use super::*;
use multisite_core::api::{MessageResponse, SuccessResponse};
use multisite_core::domain::Domain;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

#[tokio::test]
async fn test_create_first_domain_becomes_default() {
    let state = test_state(&[]);
    let app = app_as(&state, admin_account());

    let (status, body): (_, Option<SuccessResponse<Domain>>) = post_json(
        &app,
        "/api/v1/domains",
        &json!({"hostname": "Example.COM", "name": "Example", "status": "inactive"}),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let domain = body.unwrap().data;
    assert_eq!(domain.id, DomainId::from("example_com"));
    assert_eq!(domain.hostname, "example.com");
    assert!(domain.is_default);
    assert_eq!(domain.status, DomainStatus::Active);
    assert_eq!(domain.weight, 1);
}

#[tokio::test]
async fn test_create_requires_administer_domains() {
    let state = test_state(&[]);

    let (status, body): (_, Option<Value>) = post_json(
        &app(&state),
        "/api/v1/domains",
        &json!({"hostname": "example.com", "name": "Example"}),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body.unwrap()["error"], "forbidden");
    assert!(state.registry.load_default().await.unwrap().is_none());
}

#[tokio::test]
async fn test_anonymous_admin_permission_from_config() {
    let state = test_state(&[ADMINISTER_DOMAINS]);

    let (status, _): (_, Option<Value>) = post_json(
        &app(&state),
        "/api/v1/domains",
        &json!({"hostname": "example.com", "name": "Example"}),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_create_duplicate_hostname_conflicts() {
    let state = test_state(&[]);
    seed_domains(&state).await;
    let app = app_as(&state, admin_account());

    let (status, body): (_, Option<Value>) = post_json(
        &app,
        "/api/v1/domains",
        &json!({"hostname": "one.example.com", "name": "Again", "id": "again"}),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body.unwrap()["error"], "conflict");
}

#[tokio::test]
async fn test_create_invalid_hostname_is_rejected() {
    let state = test_state(&[]);
    let app = app_as(&state, admin_account());

    let (status, body): (_, Option<Value>) = post_json(
        &app,
        "/api/v1/domains",
        &json!({"hostname": "not a host", "name": "Broken"}),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body.unwrap()["error"], "validation");
}

#[tokio::test]
async fn test_list_domains_in_weight_order() {
    let state = test_state(&[]);
    seed_domains(&state).await;

    let (status, body): (_, Option<SuccessResponse<Vec<Domain>>>) =
        get_json(&app(&state), "/api/v1/domains?reset=true").await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<String> = body
        .unwrap()
        .data
        .into_iter()
        .map(|d| d.id.to_string())
        .collect();
    assert_eq!(ids, vec!["example_com", "one_example_com", "two_example_com"]);
}

#[tokio::test]
async fn test_get_domain_and_not_found() {
    let state = test_state(&[]);
    seed_domains(&state).await;
    let app = app(&state);

    let (status, body): (_, Option<SuccessResponse<Domain>>) =
        get_json(&app, "/api/v1/domains/two_example_com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap().data.hostname, "two.example.com");

    let (status, _): (_, Option<Value>) = get_json(&app, "/api/v1/domains/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_default_domain() {
    let state = test_state(&[]);
    let app = app(&state);

    let (status, _): (_, Option<Value>) = get_json(&app, "/api/v1/domains/default").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    seed_domains(&state).await;
    let (status, body): (_, Option<SuccessResponse<Domain>>) =
        get_json(&app, "/api/v1/domains/default").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap().data.id, DomainId::from("example_com"));
}

#[tokio::test]
async fn test_update_domain() {
    let state = test_state(&[]);
    seed_domains(&state).await;
    let app = app_as(&state, admin_account());

    let (status, body): (_, Option<SuccessResponse<Domain>>) = put_json(
        &app,
        "/api/v1/domains/one_example_com",
        &json!({"name": "First", "scheme": "https"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let domain = body.unwrap().data;
    assert_eq!(domain.name, "First");
    assert_eq!(domain.path(), "https://one.example.com/");

    let (status, _): (_, Option<Value>) = put_json(
        &app,
        "/api/v1/domains/one_example_com",
        &json!({"hostname": "two.example.com"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_change_default_domain() {
    let state = test_state(&[]);
    seed_domains(&state).await;
    let app = app_as(&state, admin_account());

    let (status, body): (_, Option<SuccessResponse<Domain>>) = post_json(
        &app,
        "/api/v1/domains/two_example_com/default",
        &json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.unwrap().data.is_default);

    let (_, body): (_, Option<SuccessResponse<Vec<Domain>>>) =
        get_json(&app, "/api/v1/domains").await;
    let defaults: Vec<DomainId> = body
        .unwrap()
        .data
        .into_iter()
        .filter(|d| d.is_default)
        .map(|d| d.id)
        .collect();
    assert_eq!(defaults, vec![DomainId::from("two_example_com")]);
}

#[tokio::test]
async fn test_default_domain_cannot_be_disabled() {
    let state = test_state(&[]);
    seed_domains(&state).await;
    let app = app_as(&state, admin_account());

    let (status, body): (_, Option<Value>) = put_json(
        &app,
        "/api/v1/domains/example_com/status",
        &json!({"status": "inactive"}),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body.unwrap()["error"], "invariant_violation");
}

#[tokio::test]
async fn test_inactive_domain_cannot_become_default() {
    let state = test_state(&[]);
    seed_domains(&state).await;
    let app = app_as(&state, admin_account());

    let (status, body): (_, Option<SuccessResponse<Domain>>) = put_json(
        &app,
        "/api/v1/domains/one_example_com/status",
        &json!({"status": "inactive"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap().data.status, DomainStatus::Inactive);

    let (status, body): (_, Option<Value>) = post_json(
        &app,
        "/api/v1/domains/one_example_com/default",
        &json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body.unwrap()["error"], "invariant_violation");
}

#[tokio::test]
async fn test_delete_domain() {
    let state = test_state(&[]);
    seed_domains(&state).await;
    let app = app_as(&state, admin_account());

    let (status, body): (_, Option<MessageResponse>) =
        delete_json(&app, "/api/v1/domains/two_example_com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap().message, "Domain deleted successfully");

    let (status, _): (_, Option<Value>) =
        delete_json(&app, "/api/v1/domains/two_example_com").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body): (_, Option<Value>) = delete_json(&app, "/api/v1/domains/example_com").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body.unwrap()["error"], "invariant_violation");
}

#[tokio::test]
async fn test_delete_requires_administer_domains() {
    let state = test_state(&[]);
    seed_domains(&state).await;

    let (status, _): (_, Option<Value>) =
        delete_json(&app(&state), "/api/v1/domains/two_example_com").await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(state
        .registry
        .load(&DomainId::from("two_example_com"))
        .await
        .unwrap()
        .is_some());
}

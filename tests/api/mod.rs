//! HTTP API integration test infrastructure
//!
//! Drives the production `build_router()` with the in-memory domain
//! repository, so no database is needed. Requests go through
//! `tower::ServiceExt::oneshot`.

pub mod access_http_test;
pub mod domain_http_test;
pub mod negotiation_http_test;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Extension, Router,
};
use multisite_core::config::Config;
use multisite_core::domain::{Account, CreateDomainInput, DomainId, DomainStatus};
use multisite_core::policy::{RolePermissionChecker, ADMINISTER_DOMAINS};
use multisite_core::repository::InMemoryDomainRepository;
use multisite_core::server::{build_router, AppState};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tower::ServiceExt;

pub type TestAppState = AppState<InMemoryDomainRepository>;

/// State whose anonymous visitors hold `anonymous_permissions`
pub fn test_state(anonymous_permissions: &[&str]) -> TestAppState {
    AppState::new(
        Config::default(),
        Arc::new(InMemoryDomainRepository::new()),
        Arc::new(RolePermissionChecker::new(
            anonymous_permissions.iter().copied(),
        )),
    )
}

/// Router for an anonymous visitor
pub fn app(state: &TestAppState) -> Router {
    build_router(state.clone())
}

/// Router where every request is made by `account`
pub fn app_as(state: &TestAppState, account: Account) -> Router {
    build_router(state.clone()).layer(Extension(account))
}

pub fn admin_account() -> Account {
    Account::new("1").with_permission(ADMINISTER_DOMAINS)
}

/// example.com (default), one.example.com and two.example.com
pub async fn seed_domains(state: &TestAppState) {
    for (hostname, name) in [
        ("example.com", "Example"),
        ("one.example.com", "One"),
        ("two.example.com", "Two"),
    ] {
        state
            .registry
            .create(CreateDomainInput::new(hostname, name))
            .await
            .unwrap();
    }
}

pub async fn disable(state: &TestAppState, id: &str) {
    state
        .registry
        .set_status(&DomainId::from(id), DomainStatus::Inactive)
        .await
        .unwrap();
}

async fn send<R: DeserializeOwned>(app: &Router, request: Request<Body>) -> (StatusCode, Option<R>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_default();

    if body_bytes.is_empty() {
        return (status, None);
    }

    match serde_json::from_slice(&body_bytes) {
        Ok(data) => (status, Some(data)),
        Err(_) => (status, None),
    }
}

fn json_request<T: Serialize>(method: Method, path: &str, host: &str, body: &T) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .header(header::HOST, host)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

pub async fn get_json<R: DeserializeOwned>(app: &Router, path: &str) -> (StatusCode, Option<R>) {
    get_json_on(app, "example.com", path).await
}

/// GET `path` with the Host header set to `host`
pub async fn get_json_on<R: DeserializeOwned>(
    app: &Router,
    host: &str,
    path: &str,
) -> (StatusCode, Option<R>) {
    let request = Request::builder()
        .method(Method::GET)
        .uri(path)
        .header(header::HOST, host)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json<T: Serialize, R: DeserializeOwned>(
    app: &Router,
    path: &str,
    body: &T,
) -> (StatusCode, Option<R>) {
    post_json_on(app, "example.com", path, body).await
}

pub async fn post_json_on<T: Serialize, R: DeserializeOwned>(
    app: &Router,
    host: &str,
    path: &str,
    body: &T,
) -> (StatusCode, Option<R>) {
    send(app, json_request(Method::POST, path, host, body)).await
}

pub async fn put_json<T: Serialize, R: DeserializeOwned>(
    app: &Router,
    path: &str,
    body: &T,
) -> (StatusCode, Option<R>) {
    send(app, json_request(Method::PUT, path, "example.com", body)).await
}

pub async fn delete_json<R: DeserializeOwned>(app: &Router, path: &str) -> (StatusCode, Option<R>) {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(path)
        .header(header::HOST, "example.com")
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Raw response for a GET, used where the body is not JSON
pub async fn get_raw_on(app: &Router, host: &str, path: &str) -> axum::response::Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(path)
        .header(header::HOST, host)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

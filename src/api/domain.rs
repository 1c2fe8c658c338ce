//! Domain registry administration

use crate::api::{require_domain_admin, MessageResponse, SuccessResponse};
use crate::domain::{CreateDomainInput, DomainId, DomainStatus, UpdateDomainInput};
use crate::error::{AppError, Result};
use crate::middleware::CurrentAccount;
use crate::state::HasDomainServices;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct ListDomainsQuery {
    /// Read from storage instead of the cached snapshot
    #[serde(default)]
    pub reset: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetStatusInput {
    pub status: DomainStatus,
}

/// List domains ordered by weight
pub async fn list<S: HasDomainServices>(
    State(state): State<S>,
    Query(query): Query<ListDomainsQuery>,
) -> Result<impl IntoResponse> {
    let domains = state
        .domain_registry()
        .load_multiple(None, query.reset)
        .await?;
    Ok(Json(SuccessResponse::new(domains)))
}

pub async fn get<S: HasDomainServices>(
    State(state): State<S>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = DomainId::new(id);
    let domain = state
        .domain_registry()
        .load(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Domain {} not found", id)))?;
    Ok(Json(SuccessResponse::new(domain)))
}

pub async fn get_default<S: HasDomainServices>(
    State(state): State<S>,
) -> Result<impl IntoResponse> {
    let domain = state
        .domain_registry()
        .load_default()
        .await?
        .ok_or_else(|| AppError::NotFound("No default domain is registered".to_string()))?;
    Ok(Json(SuccessResponse::new(domain)))
}

pub async fn create<S: HasDomainServices>(
    State(state): State<S>,
    CurrentAccount(account): CurrentAccount,
    Json(input): Json<CreateDomainInput>,
) -> Result<impl IntoResponse> {
    require_domain_admin(&state, &account).await?;
    let domain = state.domain_registry().create(input).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(domain))))
}

pub async fn update<S: HasDomainServices>(
    State(state): State<S>,
    CurrentAccount(account): CurrentAccount,
    Path(id): Path<String>,
    Json(input): Json<UpdateDomainInput>,
) -> Result<impl IntoResponse> {
    require_domain_admin(&state, &account).await?;
    let domain = state
        .domain_registry()
        .update(&DomainId::new(id), input)
        .await?;
    Ok(Json(SuccessResponse::new(domain)))
}

/// Enable or disable a domain
pub async fn set_status<S: HasDomainServices>(
    State(state): State<S>,
    CurrentAccount(account): CurrentAccount,
    Path(id): Path<String>,
    Json(input): Json<SetStatusInput>,
) -> Result<impl IntoResponse> {
    require_domain_admin(&state, &account).await?;
    let domain = state
        .domain_registry()
        .set_status(&DomainId::new(id), input.status)
        .await?;
    Ok(Json(SuccessResponse::new(domain)))
}

pub async fn set_default<S: HasDomainServices>(
    State(state): State<S>,
    CurrentAccount(account): CurrentAccount,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    require_domain_admin(&state, &account).await?;
    let id = DomainId::new(id);
    let registry = state.domain_registry();
    registry.set_default(&id).await?;
    let domain = registry
        .load(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Domain {} not found", id)))?;
    Ok(Json(SuccessResponse::new(domain)))
}

pub async fn delete<S: HasDomainServices>(
    State(state): State<S>,
    CurrentAccount(account): CurrentAccount,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    require_domain_admin(&state, &account).await?;
    state
        .domain_registry()
        .delete(&DomainId::new(id))
        .await?;
    Ok(Json(MessageResponse::new("Domain deleted successfully")))
}

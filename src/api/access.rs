//! Domain access checks for the negotiated domain

use crate::api::SuccessResponse;
use crate::domain::{AccessAssignment, Account, ContentItem, DomainId, ItemKind};
use crate::error::Result;
use crate::middleware::{ActiveDomain, CurrentAccount};
use crate::state::HasDomainServices;
use axum::{extract::State, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Deserialize)]
pub struct AccessCheckRequest {
    pub item: ContentItem,
    /// Defaults to the account making the request
    #[serde(default)]
    pub account: Option<Account>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessCheckResponse {
    pub allowed: bool,
    pub item_domains: BTreeSet<DomainId>,
    pub account_domains: BTreeSet<DomainId>,
    pub account_all_domains: bool,
    pub active_domain: DomainId,
}

/// Decide whether an account may see or act on a content item
pub async fn check<S: HasDomainServices>(
    State(state): State<S>,
    Extension(ActiveDomain(active)): Extension<ActiveDomain>,
    CurrentAccount(current): CurrentAccount,
    Json(request): Json<AccessCheckRequest>,
) -> Result<impl IntoResponse> {
    let account = request.account.unwrap_or(current);
    let decision = state
        .access_evaluator()
        .decide(&request.item, &account)
        .await?;

    let response = AccessCheckResponse {
        allowed: decision.allowed,
        item_domains: decision.item_domains,
        account_domains: decision.account_domains,
        account_all_domains: decision.account_all_domains,
        active_domain: active.id,
    };
    Ok(Json(SuccessResponse::new(response)))
}

#[derive(Debug, Clone, Deserialize)]
pub struct DefaultAssignmentRequest {
    pub kind: ItemKind,
}

/// Initial assignment for a new entity created on the negotiated domain
pub async fn default_assignment<S: HasDomainServices>(
    State(state): State<S>,
    Extension(ActiveDomain(active)): Extension<ActiveDomain>,
    Json(request): Json<DefaultAssignmentRequest>,
) -> Result<impl IntoResponse> {
    let assignment: AccessAssignment = state
        .default_assignments()
        .default_assignment(&request.kind, Some(&active));
    Ok(Json(SuccessResponse::new(assignment)))
}

//! Front page of the negotiated domain

use crate::api::SuccessResponse;
use crate::domain::Domain;
use crate::middleware::ActiveDomain;
use axum::{response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveDomainResponse {
    pub domain: Domain,
    pub path: String,
}

pub async fn show(Extension(ActiveDomain(domain)): Extension<ActiveDomain>) -> impl IntoResponse {
    let path = domain.path();
    Json(SuccessResponse::new(ActiveDomainResponse { domain, path }))
}

//! REST API shared utilities

pub mod access;
pub mod domain;
pub mod health;
pub mod metrics;
pub mod site;

use crate::domain::Account;
use crate::error::{AppError, Result};
use crate::policy::{PermissionChecker, ADMINISTER_DOMAINS};
use crate::state::HasDomainServices;
use serde::{Deserialize, Serialize};

/// Reject accounts lacking `administer domains`.
pub(crate) async fn require_domain_admin<S: HasDomainServices>(
    state: &S,
    account: &Account,
) -> Result<()> {
    if state
        .permissions()
        .account_has_permission(account, ADMINISTER_DOMAINS)
        .await
    {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Permission '{}' required",
            ADMINISTER_DOMAINS
        )))
    }
}

/// Success response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse<T> {
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Message response (for delete, etc.)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

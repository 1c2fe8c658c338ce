//! Inactive-domain guard
//!
//! Runs once per request right after negotiation. Visitors of a disabled
//! domain are redirected to the default domain unless they hold
//! [`ACCESS_INACTIVE_DOMAINS`].

use crate::domain::{Account, Domain, DomainStatus};
use crate::error::{AppError, Result};
use crate::repository::DomainRepository;
use crate::service::DomainRegistry;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// Permission that lets an account use a disabled domain
pub const ACCESS_INACTIVE_DOMAINS: &str = "access inactive domains";
/// Permission required by the registry admin endpoints
pub const ADMINISTER_DOMAINS: &str = "administer domains";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PermissionChecker: Send + Sync {
    async fn account_has_permission(&self, account: &Account, permission: &str) -> bool;
}

/// Grants an account its own permissions; anonymous visitors additionally
/// receive the configured anonymous permission set.
#[derive(Debug, Clone, Default)]
pub struct RolePermissionChecker {
    anonymous_permissions: HashSet<String>,
}

impl RolePermissionChecker {
    pub fn new<I, S>(anonymous_permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            anonymous_permissions: anonymous_permissions.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl PermissionChecker for RolePermissionChecker {
    async fn account_has_permission(&self, account: &Account, permission: &str) -> bool {
        account.permissions.contains(permission)
            || (account.is_anonymous() && self.anonymous_permissions.contains(permission))
    }
}

/// Per-request guard state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Active,
    InactiveNoOverride,
    InactiveOverridden,
}

impl GuardState {
    pub fn from_inputs(status: DomainStatus, has_override: bool) -> Self {
        match (status, has_override) {
            (DomainStatus::Active, _) => GuardState::Active,
            (DomainStatus::Inactive, false) => GuardState::InactiveNoOverride,
            (DomainStatus::Inactive, true) => GuardState::InactiveOverridden,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Continue processing against the negotiated domain
    Serve { domain: Domain, state: GuardState },
    /// Halt and send the visitor to the default domain
    Redirect { location: String, target: Domain },
}

impl GuardDecision {
    pub fn state(&self) -> GuardState {
        match self {
            GuardDecision::Serve { state, .. } => *state,
            GuardDecision::Redirect { .. } => GuardState::InactiveNoOverride,
        }
    }
}

pub struct InactiveDomainGuard<R: DomainRepository, P: PermissionChecker> {
    registry: Arc<DomainRegistry<R>>,
    permissions: Arc<P>,
}

impl<R: DomainRepository, P: PermissionChecker> InactiveDomainGuard<R, P> {
    pub fn new(registry: Arc<DomainRegistry<R>>, permissions: Arc<P>) -> Self {
        Self {
            registry,
            permissions,
        }
    }

    pub async fn evaluate(&self, domain: &Domain, account: &Account) -> Result<GuardDecision> {
        let has_override = match domain.status {
            DomainStatus::Active => false,
            DomainStatus::Inactive => {
                self.permissions
                    .account_has_permission(account, ACCESS_INACTIVE_DOMAINS)
                    .await
            }
        };

        match GuardState::from_inputs(domain.status, has_override) {
            GuardState::InactiveNoOverride => {
                let target = self.registry.load_default().await?.ok_or_else(|| {
                    AppError::Configuration("No default domain is registered".to_string())
                })?;
                metrics::counter!("multisite_inactive_redirect_total").increment(1);
                info!(
                    domain_id = %domain.id,
                    target = %target.id,
                    "Redirecting visitor away from inactive domain"
                );
                Ok(GuardDecision::Redirect {
                    location: target.path(),
                    target,
                })
            }
            state => Ok(GuardDecision::Serve {
                domain: domain.clone(),
                state,
            }),
        }
    }
}

//! Domain negotiation: which domain serves an inbound request

use super::registry::DomainRegistry;
use crate::domain::Domain;
use crate::error::{AppError, Result};
use crate::repository::DomainRepository;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

pub struct DomainNegotiator<R: DomainRepository> {
    registry: Arc<DomainRegistry<R>>,
}

impl<R: DomainRepository> DomainNegotiator<R> {
    pub fn new(registry: Arc<DomainRegistry<R>>) -> Self {
        Self { registry }
    }

    /// Resolve the domain for `request_host`.
    ///
    /// Matching is exact and case-insensitive (no wildcard or subdomain
    /// matching). Unknown hosts fall back to the default domain; an empty
    /// registry is a configuration error.
    pub async fn resolve(&self, request_host: &str) -> Result<Domain> {
        let snapshot = self.registry.snapshot().await?;
        let host = request_host.trim().to_lowercase();

        if let Some(domain) = snapshot.by_hostname(&host) {
            metrics::counter!("multisite_negotiation_total", "outcome" => "matched").increment(1);
            return Ok(domain.clone());
        }

        match snapshot.default_domain() {
            Some(domain) => {
                metrics::counter!("multisite_negotiation_total", "outcome" => "fallback")
                    .increment(1);
                debug!(host = %host, domain_id = %domain.id, "No domain matches host, using default");
                Ok(domain.clone())
            }
            None => {
                metrics::counter!("multisite_negotiation_total", "outcome" => "unconfigured")
                    .increment(1);
                Err(AppError::Configuration(
                    "No default domain is registered".to_string(),
                ))
            }
        }
    }
}

/// Negotiation state for a single request.
///
/// The first call to [`RequestNegotiation::active_domain`] resolves the
/// domain; later calls return the same value even if the registry changes
/// meanwhile. Never share one instance between requests.
#[derive(Debug)]
pub struct RequestNegotiation {
    host: String,
    resolved: OnceCell<Domain>,
}

impl RequestNegotiation {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            resolved: OnceCell::new(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub async fn active_domain<R: DomainRepository>(
        &self,
        negotiator: &DomainNegotiator<R>,
    ) -> Result<&Domain> {
        self.resolved
            .get_or_try_init(|| negotiator.resolve(&self.host))
            .await
    }

    /// The resolved domain, if negotiation already ran
    pub fn get(&self) -> Option<&Domain> {
        self.resolved.get()
    }
}

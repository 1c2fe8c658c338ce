//! Application state traits for dependency injection
//!
//! Handlers and middleware are generic over [`HasDomainServices`] so the
//! same router runs against MySQL in production and the in-memory
//! repository in tests.

use crate::config::Config;
use crate::policy::{AccessEvaluator, DefaultAssignments, InactiveDomainGuard, PermissionChecker};
use crate::repository::DomainRepository;
use crate::service::{DomainNegotiator, DomainRegistry};
use metrics_exporter_prometheus::PrometheusHandle;

/// Trait for application state that provides access to the domain services.
pub trait HasDomainServices: Clone + Send + Sync + 'static {
    /// The domain repository type
    type DomainRepo: DomainRepository + 'static;
    /// The permission lookup used by the guard and admin endpoints
    type Permissions: PermissionChecker + 'static;

    /// Get the application configuration
    fn config(&self) -> &Config;

    fn domain_registry(&self) -> &DomainRegistry<Self::DomainRepo>;

    fn domain_negotiator(&self) -> &DomainNegotiator<Self::DomainRepo>;

    fn access_evaluator(&self) -> &AccessEvaluator<Self::DomainRepo>;

    fn inactive_guard(&self) -> &InactiveDomainGuard<Self::DomainRepo, Self::Permissions>;

    fn permissions(&self) -> &Self::Permissions;

    fn default_assignments(&self) -> &DefaultAssignments;

    /// Present when metrics are enabled
    fn prometheus_handle(&self) -> Option<&PrometheusHandle>;
}

//! Server initialization and routing

use crate::api;
use crate::config::Config;
use crate::domain::{CreateDomainInput, Domain};
use crate::middleware::domain_negotiation_middleware;
use crate::policy::{
    AccessEvaluator, DefaultAssignments, InactiveDomainGuard, PermissionChecker,
    RolePermissionChecker,
};
use crate::repository::{DomainRepository, DomainRepositoryImpl, InMemoryDomainRepository};
use crate::service::{DomainNegotiator, DomainRegistry};
use crate::state::HasDomainServices;
use anyhow::{Context, Result};
use axum::{
    routing::{get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

/// Application state shared across handlers
pub struct AppState<R: DomainRepository, P: PermissionChecker = RolePermissionChecker> {
    pub config: Arc<Config>,
    pub registry: Arc<DomainRegistry<R>>,
    pub negotiator: Arc<DomainNegotiator<R>>,
    pub evaluator: Arc<AccessEvaluator<R>>,
    pub guard: Arc<InactiveDomainGuard<R, P>>,
    pub permissions: Arc<P>,
    pub default_assignments: Arc<DefaultAssignments>,
    pub prometheus_handle: Option<PrometheusHandle>,
}

impl<R: DomainRepository, P: PermissionChecker> Clone for AppState<R, P> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            registry: self.registry.clone(),
            negotiator: self.negotiator.clone(),
            evaluator: self.evaluator.clone(),
            guard: self.guard.clone(),
            permissions: self.permissions.clone(),
            default_assignments: self.default_assignments.clone(),
            prometheus_handle: self.prometheus_handle.clone(),
        }
    }
}

impl<R: DomainRepository, P: PermissionChecker> AppState<R, P> {
    /// Wire the registry and the services that read through it
    pub fn new(config: Config, repo: Arc<R>, permissions: Arc<P>) -> Self {
        let registry = Arc::new(
            DomainRegistry::new(repo).with_default_scheme(config.domains.default_scheme),
        );
        Self {
            config: Arc::new(config),
            negotiator: Arc::new(DomainNegotiator::new(registry.clone())),
            evaluator: Arc::new(AccessEvaluator::new(registry.clone())),
            guard: Arc::new(InactiveDomainGuard::new(
                registry.clone(),
                permissions.clone(),
            )),
            registry,
            permissions,
            default_assignments: Arc::new(DefaultAssignments::with_builtin_kinds()),
            prometheus_handle: None,
        }
    }

    pub fn with_prometheus_handle(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.prometheus_handle = handle;
        self
    }
}

impl<R, P> HasDomainServices for AppState<R, P>
where
    R: DomainRepository + 'static,
    P: PermissionChecker + 'static,
{
    type DomainRepo = R;
    type Permissions = P;

    fn config(&self) -> &Config {
        &self.config
    }

    fn domain_registry(&self) -> &DomainRegistry<R> {
        &self.registry
    }

    fn domain_negotiator(&self) -> &DomainNegotiator<R> {
        &self.negotiator
    }

    fn access_evaluator(&self) -> &AccessEvaluator<R> {
        &self.evaluator
    }

    fn inactive_guard(&self) -> &InactiveDomainGuard<R, P> {
        &self.guard
    }

    fn permissions(&self) -> &P {
        &self.permissions
    }

    fn default_assignments(&self) -> &DefaultAssignments {
        &self.default_assignments
    }

    fn prometheus_handle(&self) -> Option<&PrometheusHandle> {
        self.prometheus_handle.as_ref()
    }
}

/// Run the HTTP server until a shutdown signal arrives
pub async fn run(config: Config, prometheus_handle: Option<PrometheusHandle>) -> Result<()> {
    let permissions = Arc::new(RolePermissionChecker::new(
        config.domains.anonymous_permissions.clone(),
    ));

    match config.database.clone() {
        Some(database) => {
            let db_pool = MySqlPoolOptions::new()
                .max_connections(database.max_connections)
                .min_connections(database.min_connections)
                .connect(&database.url)
                .await
                .context("Failed to connect to database")?;
            info!("Connected to database");

            let repo = Arc::new(DomainRepositoryImpl::new(db_pool));
            let state = AppState::new(config, repo, permissions)
                .with_prometheus_handle(prometheus_handle);
            serve(state).await
        }
        None => {
            warn!("DATABASE_URL not set, domains are kept in process memory");
            let repo = Arc::new(InMemoryDomainRepository::new());
            let state = AppState::new(config, repo, permissions)
                .with_prometheus_handle(prometheus_handle);
            serve(state).await
        }
    }
}

async fn serve<S: HasDomainServices>(state: S) -> Result<()> {
    bootstrap_default_domain(&state)
        .await
        .context("Failed to bootstrap the default domain")?;

    let http_addr = state.config().http_addr();
    let app = build_router(state);

    let listener = TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("Failed to bind {}", http_addr))?;
    info!("HTTP server started on {}", http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server stopped");
    Ok(())
}

/// Create the configured default domain when the registry is empty.
///
/// Returns the created domain, or `None` when nothing was configured or the
/// registry already holds domains.
pub async fn bootstrap_default_domain<S: HasDomainServices>(
    state: &S,
) -> crate::error::Result<Option<Domain>> {
    let config = &state.config().domains;
    let Some(hostname) = config.default_hostname.as_deref() else {
        return Ok(None);
    };

    let registry = state.domain_registry();
    if !registry.load_multiple(None, true).await?.is_empty() {
        return Ok(None);
    }

    let domain = registry
        .create(CreateDomainInput::new(hostname, config.default_name.as_str()))
        .await?;
    info!(domain_id = %domain.id, hostname = %domain.hostname, "Bootstrapped default domain");
    Ok(Some(domain))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

/// Build the HTTP router with generic state type
///
/// Registry administration stays outside domain negotiation so an empty
/// registry can still be populated. Everything else is served in the
/// context of the negotiated domain.
pub fn build_router<S: HasDomainServices>(state: S) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let negotiated = Router::new()
        .route("/", get(api::site::show))
        .route("/api/v1/access/check", post(api::access::check::<S>))
        .route(
            "/api/v1/access/default-assignment",
            post(api::access::default_assignment::<S>),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            domain_negotiation_middleware::<S>,
        ));

    Router::new()
        // Health endpoints
        .route("/health", get(api::health::health))
        .route("/metrics", get(api::metrics::metrics_handler::<S>))
        // Registry administration
        .route(
            "/api/v1/domains",
            get(api::domain::list::<S>).post(api::domain::create::<S>),
        )
        .route("/api/v1/domains/default", get(api::domain::get_default::<S>))
        .route(
            "/api/v1/domains/{id}",
            get(api::domain::get::<S>)
                .put(api::domain::update::<S>)
                .delete(api::domain::delete::<S>),
        )
        .route(
            "/api/v1/domains/{id}/status",
            put(api::domain::set_status::<S>),
        )
        .route(
            "/api/v1/domains/{id}/default",
            post(api::domain::set_default::<S>),
        )
        .merge(negotiated)
        // Add middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

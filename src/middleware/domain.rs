//! Domain negotiation middleware
//!
//! Resolves the active domain for each request from its Host header, runs
//! the inactive-domain guard and exposes the result as an [`ActiveDomain`]
//! request extension.

use crate::domain::{Account, Domain};
use crate::policy::GuardDecision;
use crate::service::RequestNegotiation;
use crate::state::HasDomainServices;
use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, Request, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::convert::Infallible;
use tracing::debug;

const X_FORWARDED_HOST: &str = "x-forwarded-host";

/// Domain negotiated for the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDomain(pub Domain);

/// Account attached to the request by an upstream authentication layer.
///
/// Requests without one are treated as anonymous.
#[derive(Debug, Clone)]
pub struct CurrentAccount(pub Account);

impl<S> FromRequestParts<S> for CurrentAccount
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let account = parts
            .extensions
            .get::<Account>()
            .cloned()
            .unwrap_or_else(Account::anonymous);
        Ok(CurrentAccount(account))
    }
}

/// Host the request was addressed to, port included, since registered
/// hostnames may carry one.
///
/// `X-Forwarded-Host` is only honoured when the deployment sits behind a
/// trusted proxy. HTTP/2 requests carry the host in the URI authority.
pub fn request_host(headers: &HeaderMap, uri: &Uri, trust_forwarded_host: bool) -> String {
    let forwarded = trust_forwarded_host
        .then(|| headers.get(X_FORWARDED_HOST))
        .flatten()
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next());

    let raw = forwarded
        .or_else(|| headers.get(header::HOST).and_then(|v| v.to_str().ok()))
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .unwrap_or_default();

    raw.trim().to_lowercase()
}

/// Negotiate the active domain and apply the inactive-domain guard.
pub async fn domain_negotiation_middleware<S: HasDomainServices>(
    State(state): State<S>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let host = request_host(
        request.headers(),
        request.uri(),
        state.config().domains.trust_forwarded_host,
    );
    let negotiation = RequestNegotiation::new(host);

    let domain = match negotiation.active_domain(state.domain_negotiator()).await {
        Ok(domain) => domain.clone(),
        Err(e) => return e.into_response(),
    };

    let account = request
        .extensions()
        .get::<Account>()
        .cloned()
        .unwrap_or_else(Account::anonymous);

    match state.inactive_guard().evaluate(&domain, &account).await {
        Ok(GuardDecision::Serve { domain, state }) => {
            debug!(host = %negotiation.host(), domain_id = %domain.id, ?state, "Domain negotiated");
            request.extensions_mut().insert(ActiveDomain(domain));
            next.run(request).await
        }
        Ok(GuardDecision::Redirect { location, .. }) => {
            (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
        }
        Err(e) => e.into_response(),
    }
}

//! Prometheus metrics setup and metric definitions

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_prometheus_recorder() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

/// Register metric descriptions and emit initial zero values so Prometheus output
/// includes HELP/TYPE lines for all metrics from startup (not just after first use).
pub fn describe_metrics() {
    describe_counter!(
        "multisite_negotiation_total",
        "Domain negotiations by outcome (matched/fallback/unconfigured)"
    );
    describe_counter!(
        "multisite_inactive_redirect_total",
        "Visitors redirected away from an inactive domain"
    );
    describe_counter!(
        "multisite_access_checks_total",
        "Domain access decisions by result"
    );
    describe_counter!(
        "multisite_registry_cache_total",
        "Domain registry cache lookups by result (hit/miss)"
    );

    counter!("multisite_negotiation_total", "outcome" => "matched").absolute(0);
    counter!("multisite_negotiation_total", "outcome" => "fallback").absolute(0);
    counter!("multisite_inactive_redirect_total").absolute(0);
    counter!("multisite_access_checks_total", "result" => "allow").absolute(0);
    counter!("multisite_access_checks_total", "result" => "deny").absolute(0);
    counter!("multisite_registry_cache_total", "result" => "hit").absolute(0);
    counter!("multisite_registry_cache_total", "result" => "miss").absolute(0);
}

//! Configuration management for Multisite Core

use crate::domain::DomainScheme;
use anyhow::{Context, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server host
    pub http_host: String,
    /// HTTP server port
    pub http_port: u16,
    /// Database configuration; domains are kept in process memory when absent
    pub database: Option<DatabaseConfig>,
    /// Logging and metrics
    pub telemetry: TelemetryConfig,
    /// Domain registry and negotiation settings
    pub domains: DomainConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// "json" or "pretty"
    pub log_format: String,
    pub metrics_enabled: bool,
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            service_name: "multisite-core".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DomainConfig {
    /// Domain created at startup when the registry is empty
    pub default_hostname: Option<String>,
    pub default_name: String,
    /// Scheme for domains created without one
    pub default_scheme: DomainScheme,
    /// Permissions granted to anonymous visitors
    pub anonymous_permissions: Vec<String>,
    /// Negotiate on X-Forwarded-Host when set by a trusted proxy
    pub trust_forwarded_host: bool,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            default_hostname: None,
            default_name: "Default".to_string(),
            default_scheme: DomainScheme::Http,
            anonymous_permissions: vec![],
            trust_forwarded_host: false,
        }
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let database = match env::var("DATABASE_URL") {
            Ok(url) if !url.is_empty() => Some(DatabaseConfig {
                url,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "2".to_string())
                    .parse()
                    .unwrap_or(2),
            }),
            _ => None,
        };

        Ok(Self {
            http_host: env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid HTTP_PORT")?,
            database,
            telemetry: TelemetryConfig {
                log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
                metrics_enabled: env::var("METRICS_ENABLED")
                    .map(|s| s.to_lowercase() == "true")
                    .unwrap_or(false),
                service_name: env::var("SERVICE_NAME")
                    .unwrap_or_else(|_| "multisite-core".to_string()),
            },
            domains: DomainConfig {
                default_hostname: env::var("DEFAULT_DOMAIN_HOSTNAME")
                    .ok()
                    .filter(|s| !s.is_empty()),
                default_name: env::var("DEFAULT_DOMAIN_NAME")
                    .unwrap_or_else(|_| "Default".to_string()),
                default_scheme: env::var("DOMAIN_DEFAULT_SCHEME")
                    .unwrap_or_else(|_| "http".to_string())
                    .parse::<DomainScheme>()
                    .map_err(anyhow::Error::msg)
                    .context("Invalid DOMAIN_DEFAULT_SCHEME")?,
                anonymous_permissions: env::var("ANONYMOUS_PERMISSIONS")
                    .map(|s| parse_list(&s))
                    .unwrap_or_default(),
                trust_forwarded_host: env::var("TRUST_FORWARDED_HOST")
                    .map(|s| s.to_lowercase() == "true")
                    .unwrap_or(false),
            },
        })
    }

    /// Get HTTP server address; IPv6 hosts are bracketed
    pub fn http_addr(&self) -> String {
        if self.http_host.contains(':') && !self.http_host.starts_with('[') {
            format!("[{}]:{}", self.http_host, self.http_port)
        } else {
            format!("{}:{}", self.http_host, self.http_port)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_host: "127.0.0.1".to_string(),
            http_port: 8080,
            database: None,
            telemetry: TelemetryConfig::default(),
            domains: DomainConfig::default(),
        }
    }
}

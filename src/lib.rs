//! Multisite Core - domain registry and access service
//!
//! Serves many logical sites ("domains") from one deployment: a registry of
//! domains, per-request domain negotiation, domain-based access decisions
//! for accounts and content, and redirection away from disabled domains.

pub mod api;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod policy;
pub mod repository;
pub mod server;
pub mod service;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};

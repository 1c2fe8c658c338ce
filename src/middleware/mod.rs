//! HTTP middleware

pub mod domain;

pub use domain::{domain_negotiation_middleware, ActiveDomain, CurrentAccount};

//! Business logic layer

pub mod negotiator;
pub mod registry;

pub use negotiator::{DomainNegotiator, RequestNegotiation};
pub use registry::DomainRegistry;

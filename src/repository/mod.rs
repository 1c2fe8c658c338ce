//! Data access layer (Repository pattern)

pub mod domain;
pub mod in_memory;

pub use domain::{DomainRepository, DomainRepositoryImpl};
pub use in_memory::InMemoryDomainRepository;

//! Domain models for Multisite Core

pub mod access;
pub mod common;
pub mod site;

pub use access::*;
pub use common::*;
pub use site::*;

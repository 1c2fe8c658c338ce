//! Domain access policy: grant resolution, access decisions, default
//! assignments and the inactive-domain guard.

pub mod access;
pub mod defaults;
pub mod inactive;

pub use access::{check_access_in, AccessDecision, AccessEvaluator, AccessGrantResolver};
pub use defaults::{seed_active_domain, AssignmentStrategy, DefaultAssignments};
pub use inactive::{
    GuardDecision, GuardState, InactiveDomainGuard, PermissionChecker, RolePermissionChecker,
    ACCESS_INACTIVE_DOMAINS, ADMINISTER_DOMAINS,
};

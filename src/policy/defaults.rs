//! Default access assignments for newly created entities

use crate::domain::{AccessAssignment, Domain, ItemKind};
use std::collections::HashMap;
use std::sync::Arc;

/// Computes the initial assignment of an entity from the negotiated domain
pub type AssignmentStrategy = Arc<dyn Fn(Option<&Domain>) -> AccessAssignment + Send + Sync>;

/// Seed the assignment with the active domain, if one is known
pub fn seed_active_domain(active: Option<&Domain>) -> AccessAssignment {
    AccessAssignment {
        domain_ids: active.map(|d| d.id.clone()).into_iter().collect(),
        all_domains: false,
    }
}

/// Registry of default-assignment strategies keyed by entity kind.
///
/// Kinds without a registered strategy get an empty assignment.
#[derive(Clone)]
pub struct DefaultAssignments {
    strategies: HashMap<ItemKind, AssignmentStrategy>,
}

impl DefaultAssignments {
    /// No kinds registered
    pub fn empty() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// Accounts and content seeded with the active domain
    pub fn with_builtin_kinds() -> Self {
        let mut defaults = Self::empty();
        defaults.register(ItemKind::account(), seed_active_domain);
        defaults.register(ItemKind::content(), seed_active_domain);
        defaults
    }

    pub fn register<F>(&mut self, kind: ItemKind, strategy: F)
    where
        F: Fn(Option<&Domain>) -> AccessAssignment + Send + Sync + 'static,
    {
        self.strategies.insert(kind, Arc::new(strategy));
    }

    pub fn is_registered(&self, kind: &ItemKind) -> bool {
        self.strategies.contains_key(kind)
    }

    /// Assignment for a new entity of `kind` created while `active` is the
    /// negotiated domain. The all-domains flag always starts false for the
    /// built-in kinds.
    pub fn default_assignment(&self, kind: &ItemKind, active: Option<&Domain>) -> AccessAssignment {
        match self.strategies.get(kind) {
            Some(strategy) => strategy(active),
            None => AccessAssignment::default(),
        }
    }
}

impl Default for DefaultAssignments {
    fn default() -> Self {
        Self::with_builtin_kinds()
    }
}

impl std::fmt::Debug for DefaultAssignments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultAssignments")
            .field("kinds", &self.strategies.keys().collect::<Vec<_>>())
            .finish()
    }
}

//! Domain registry cache
//!
//! The registry keeps one immutable snapshot of every domain in memory.
//! Snapshots never expire on their own; every registry write calls
//! [`DomainCache::invalidate`] after it has committed, and the next read
//! rebuilds the snapshot from storage.

use crate::domain::{Domain, DomainId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Immutable view of the registry at one point in time
#[derive(Debug, Default)]
pub struct DomainSnapshot {
    domains: Vec<Domain>,
    by_id: HashMap<DomainId, usize>,
    by_hostname: HashMap<String, usize>,
}

impl DomainSnapshot {
    pub fn new(mut domains: Vec<Domain>) -> Self {
        domains.sort_by(|a, b| a.weight.cmp(&b.weight).then_with(|| a.id.cmp(&b.id)));
        let by_id = domains
            .iter()
            .enumerate()
            .map(|(i, d)| (d.id.clone(), i))
            .collect();
        let by_hostname = domains
            .iter()
            .enumerate()
            .map(|(i, d)| (d.hostname.to_lowercase(), i))
            .collect();
        Self {
            domains,
            by_id,
            by_hostname,
        }
    }

    /// Domains ordered by weight
    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }

    pub fn get(&self, id: &DomainId) -> Option<&Domain> {
        self.by_id.get(id).map(|&i| &self.domains[i])
    }

    pub fn contains(&self, id: &DomainId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Exact, case-insensitive hostname lookup
    pub fn by_hostname(&self, hostname: &str) -> Option<&Domain> {
        self.by_hostname
            .get(&hostname.trim().to_lowercase())
            .map(|&i| &self.domains[i])
    }

    pub fn default_domain(&self) -> Option<&Domain> {
        self.domains.iter().find(|d| d.is_default)
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

/// Scoped cache owned by a single registry
#[derive(Default)]
pub struct DomainCache {
    slot: RwLock<Option<Arc<DomainSnapshot>>>,
    generation: AtomicU64,
}

impl DomainCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot, if one is cached
    pub async fn get(&self) -> Option<Arc<DomainSnapshot>> {
        let cached = self.slot.read().await.clone();
        let result = if cached.is_some() { "hit" } else { "miss" };
        metrics::counter!("multisite_registry_cache_total", "result" => result).increment(1);
        cached
    }

    /// Generation to pass to [`DomainCache::store`] for a load started now.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Store a snapshot loaded at `generation`.
    ///
    /// Returns false and drops the snapshot when an invalidation happened
    /// while it was being loaded.
    pub async fn store(&self, generation: u64, snapshot: Arc<DomainSnapshot>) -> bool {
        let mut slot = self.slot.write().await;
        if self.generation.load(Ordering::Acquire) != generation {
            return false;
        }
        *slot = Some(snapshot);
        true
    }

    /// Drop the cached snapshot
    pub async fn invalidate(&self) {
        let mut slot = self.slot.write().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        *slot = None;
        tracing::debug!("Domain registry cache invalidated");
    }
}

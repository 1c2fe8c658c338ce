//! Domain access grants and the account/content access decision

use crate::cache::DomainSnapshot;
use crate::domain::{DomainAssignable, DomainId};
use crate::error::Result;
use crate::repository::DomainRepository;
use crate::service::DomainRegistry;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Effective domain ids of `item` against one registry snapshot.
///
/// References to domains missing from the snapshot are dropped silently, so
/// an entity's effective set narrows as domains are deleted.
pub fn domain_ids_in<T>(snapshot: &DomainSnapshot, item: &T) -> BTreeSet<DomainId>
where
    T: DomainAssignable + ?Sized,
{
    item.domain_references()
        .unwrap_or_default()
        .into_iter()
        .filter(|id| snapshot.contains(id))
        .collect()
}

/// All-domains flag of `item`; absent means false.
pub fn all_domains_flag_of<T>(item: &T) -> bool
where
    T: DomainAssignable + ?Sized,
{
    item.all_domains_flag().unwrap_or(false)
}

/// Access decision against one registry snapshot.
///
/// 1. An account flagged for all domains may access any item that carries at
///    least one live domain. An item with no domains is not matched by the
///    flag, since there is nothing to match against.
/// 2. Otherwise access requires a shared domain.
pub fn check_access_in<I, A>(snapshot: &DomainSnapshot, item: &I, account: &A) -> bool
where
    I: DomainAssignable + ?Sized,
    A: DomainAssignable + ?Sized,
{
    let item_domains = domain_ids_in(snapshot, item);
    if all_domains_flag_of(account) && !item_domains.is_empty() {
        return true;
    }
    let account_domains = domain_ids_in(snapshot, account);
    !item_domains.is_disjoint(&account_domains)
}

/// Reads assignments of accounts and content items through the registry
pub struct AccessGrantResolver<R: DomainRepository> {
    registry: Arc<DomainRegistry<R>>,
}

impl<R: DomainRepository> Clone for AccessGrantResolver<R> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
        }
    }
}

impl<R: DomainRepository> AccessGrantResolver<R> {
    pub fn new(registry: Arc<DomainRegistry<R>>) -> Self {
        Self { registry }
    }

    /// Live domain ids referenced by `item`; empty when it has no assignment
    pub async fn domain_ids_of<T>(&self, item: &T) -> Result<BTreeSet<DomainId>>
    where
        T: DomainAssignable + ?Sized,
    {
        let snapshot = self.registry.snapshot().await?;
        Ok(domain_ids_in(&snapshot, item))
    }

    pub fn all_domains_flag_of<T>(&self, item: &T) -> bool
    where
        T: DomainAssignable + ?Sized,
    {
        all_domains_flag_of(item)
    }
}

/// Access decision together with the grants it was made from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDecision {
    pub allowed: bool,
    pub item_domains: BTreeSet<DomainId>,
    pub account_domains: BTreeSet<DomainId>,
    pub account_all_domains: bool,
}

impl AccessDecision {
    /// Decide against one snapshot so the verdict and the reported grants agree
    pub fn in_snapshot<I, A>(snapshot: &DomainSnapshot, item: &I, account: &A) -> Self
    where
        I: DomainAssignable + ?Sized,
        A: DomainAssignable + ?Sized,
    {
        Self {
            allowed: check_access_in(snapshot, item, account),
            item_domains: domain_ids_in(snapshot, item),
            account_domains: domain_ids_in(snapshot, account),
            account_all_domains: all_domains_flag_of(account),
        }
    }
}

fn record_decision(allowed: bool) {
    let result = if allowed { "allow" } else { "deny" };
    metrics::counter!("multisite_access_checks_total", "result" => result).increment(1);
}

/// Decides whether an account may see or act on a content item
pub struct AccessEvaluator<R: DomainRepository> {
    resolver: AccessGrantResolver<R>,
}

impl<R: DomainRepository> AccessEvaluator<R> {
    pub fn new(registry: Arc<DomainRegistry<R>>) -> Self {
        Self {
            resolver: AccessGrantResolver::new(registry),
        }
    }

    pub fn resolver(&self) -> &AccessGrantResolver<R> {
        &self.resolver
    }

    pub async fn check_access<I, A>(&self, item: &I, account: &A) -> Result<bool>
    where
        I: DomainAssignable + ?Sized,
        A: DomainAssignable + ?Sized,
    {
        let snapshot = self.resolver.registry.snapshot().await?;
        let allowed = check_access_in(&snapshot, item, account);
        record_decision(allowed);
        Ok(allowed)
    }

    /// Like [`AccessEvaluator::check_access`], also returning the effective grants
    pub async fn decide<I, A>(&self, item: &I, account: &A) -> Result<AccessDecision>
    where
        I: DomainAssignable + ?Sized,
        A: DomainAssignable + ?Sized,
    {
        let snapshot = self.resolver.registry.snapshot().await?;
        let decision = AccessDecision::in_snapshot(&snapshot, item, account);
        record_decision(decision.allowed);
        Ok(decision)
    }
}

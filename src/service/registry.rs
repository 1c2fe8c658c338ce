//! Domain registry: the authoritative catalog of domains

use crate::cache::{DomainCache, DomainSnapshot};
use crate::domain::{
    CreateDomainInput, Domain, DomainId, DomainScheme, DomainStatus, NewDomain,
    UpdateDomainInput, MAX_MACHINE_NAME_LENGTH,
};
use crate::error::{AppError, Result};
use crate::repository::DomainRepository;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use validator::Validate;

/// Owns the uniqueness and default-domain invariants.
///
/// Every mutation runs under `write_lock` and invalidates the snapshot cache
/// once storage has committed, so readers see either the state before or the
/// state after a write, never a registry with zero or two defaults.
pub struct DomainRegistry<R: DomainRepository> {
    repo: Arc<R>,
    cache: DomainCache,
    write_lock: Mutex<()>,
    default_scheme: DomainScheme,
}

impl<R: DomainRepository> DomainRegistry<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self {
            repo,
            cache: DomainCache::new(),
            write_lock: Mutex::new(()),
            default_scheme: DomainScheme::default(),
        }
    }

    /// Scheme given to domains created without an explicit one
    pub fn with_default_scheme(mut self, scheme: DomainScheme) -> Self {
        self.default_scheme = scheme;
        self
    }

    // ==================== Reads ====================

    /// Current registry snapshot, served from cache when possible
    pub async fn snapshot(&self) -> Result<Arc<DomainSnapshot>> {
        if let Some(snapshot) = self.cache.get().await {
            return Ok(snapshot);
        }
        self.reload().await
    }

    async fn reload(&self) -> Result<Arc<DomainSnapshot>> {
        let generation = self.cache.generation();
        let snapshot = Arc::new(DomainSnapshot::new(self.repo.list().await?));
        self.cache.store(generation, snapshot.clone()).await;
        Ok(snapshot)
    }

    pub async fn load(&self, id: &DomainId) -> Result<Option<Domain>> {
        Ok(self.snapshot().await?.get(id).cloned())
    }

    /// Domains ordered by weight; `ids = None` returns every domain.
    ///
    /// `bypass_cache` reads storage directly and refreshes the cache.
    pub async fn load_multiple(
        &self,
        ids: Option<&[DomainId]>,
        bypass_cache: bool,
    ) -> Result<Vec<Domain>> {
        let snapshot = if bypass_cache {
            self.reload().await?
        } else {
            self.snapshot().await?
        };

        let domains = match ids {
            None => snapshot.domains().to_vec(),
            Some(ids) => snapshot
                .domains()
                .iter()
                .filter(|d| ids.contains(&d.id))
                .cloned()
                .collect(),
        };
        Ok(domains)
    }

    /// `None` only when the registry is empty
    pub async fn load_default(&self) -> Result<Option<Domain>> {
        Ok(self.snapshot().await?.default_domain().cloned())
    }

    pub async fn load_default_id(&self) -> Result<Option<DomainId>> {
        Ok(self.load_default().await?.map(|d| d.id))
    }

    pub async fn load_by_hostname(&self, hostname: &str) -> Result<Option<Domain>> {
        Ok(self.snapshot().await?.by_hostname(hostname).cloned())
    }

    // ==================== Writes ====================

    /// Create a domain. The first domain in an empty registry becomes the
    /// default and is always active.
    pub async fn create(&self, mut input: CreateDomainInput) -> Result<Domain> {
        input.normalize();
        input.validate()?;

        let id = input.machine_name();
        if id.is_empty() {
            return Err(AppError::Validation(format!(
                "Cannot derive a machine name from hostname '{}'",
                input.hostname
            )));
        }
        if id.as_str().len() > MAX_MACHINE_NAME_LENGTH {
            return Err(AppError::Validation(format!(
                "Machine name derived from hostname '{}' exceeds {} characters; pass an explicit id",
                input.hostname, MAX_MACHINE_NAME_LENGTH
            )));
        }

        let _guard = self.write_lock.lock().await;

        if self.repo.find_by_id(&id).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Domain with id '{}' already exists",
                id
            )));
        }
        if self.repo.find_by_hostname(&input.hostname).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Domain with hostname '{}' already exists",
                input.hostname
            )));
        }

        let count = self.repo.count().await?;
        let is_first = count == 0;
        let new = NewDomain {
            id,
            hostname: input.hostname,
            name: input.name,
            scheme: input.scheme.unwrap_or(self.default_scheme),
            weight: input.weight.unwrap_or(count as i32 + 1),
            status: if is_first {
                DomainStatus::Active
            } else {
                input.status.unwrap_or_default()
            },
            is_default: is_first,
        };

        let domain = self.repo.create(&new).await?;
        self.cache.invalidate().await;

        info!(
            domain_id = %domain.id,
            hostname = %domain.hostname,
            is_default = domain.is_default,
            "Domain created"
        );
        Ok(domain)
    }

    /// Change hostname, display name, scheme or weight
    pub async fn update(&self, id: &DomainId, mut input: UpdateDomainInput) -> Result<Domain> {
        input.normalize();
        input.validate()?;

        let _guard = self.write_lock.lock().await;
        self.require(id).await?;

        if let Some(hostname) = &input.hostname {
            if let Some(other) = self.repo.find_by_hostname(hostname).await? {
                if &other.id != id {
                    return Err(AppError::Conflict(format!(
                        "Domain with hostname '{}' already exists",
                        hostname
                    )));
                }
            }
        }

        let domain = self.repo.update(id, &input).await?;
        self.cache.invalidate().await;
        info!(domain_id = %id, "Domain updated");
        Ok(domain)
    }

    /// Enable or disable a domain. The default domain cannot be disabled.
    pub async fn set_status(&self, id: &DomainId, status: DomainStatus) -> Result<Domain> {
        let _guard = self.write_lock.lock().await;
        let existing = self.require(id).await?;

        if existing.status == status {
            return Ok(existing);
        }
        if existing.is_default && status == DomainStatus::Inactive {
            return Err(AppError::InvariantViolation(format!(
                "Domain {} is the default domain and cannot be disabled",
                id
            )));
        }

        let domain = self.repo.set_status(id, status).await?;
        self.cache.invalidate().await;
        info!(domain_id = %id, status = %status, "Domain status changed");
        Ok(domain)
    }

    /// Make `id` the single default domain
    pub async fn set_default(&self, id: &DomainId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let existing = self.require(id).await?;

        if existing.is_default {
            return Ok(());
        }
        if !existing.is_active() {
            return Err(AppError::InvariantViolation(format!(
                "Domain {} is inactive and cannot become the default domain",
                id
            )));
        }

        self.repo.set_default(id).await?;
        self.cache.invalidate().await;
        info!(domain_id = %id, "Default domain changed");
        Ok(())
    }

    /// Delete a domain. The default domain can only be deleted when it is the
    /// last one left.
    pub async fn delete(&self, id: &DomainId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let existing = self.require(id).await?;

        if existing.is_default && self.repo.count().await? > 1 {
            warn!(domain_id = %id, "Refusing to delete the default domain");
            return Err(AppError::InvariantViolation(format!(
                "Domain {} is the default domain; assign another default first",
                id
            )));
        }

        self.repo.delete(id).await?;
        self.cache.invalidate().await;
        info!(domain_id = %id, "Domain deleted");
        Ok(())
    }

    /// Drop cached reads; used by bulk flush signals
    pub async fn invalidate(&self) {
        self.cache.invalidate().await;
    }

    async fn require(&self, id: &DomainId) -> Result<Domain> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Domain {} not found", id)))
    }
}

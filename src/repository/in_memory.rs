//! Process-local domain storage, used when no database is configured

use super::domain::DomainRepository;
use crate::domain::{Domain, DomainId, DomainStatus, NewDomain, UpdateDomainInput};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryDomainRepository {
    domains: RwLock<Vec<Domain>>,
}

impl InMemoryDomainRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(id: &DomainId) -> AppError {
    AppError::NotFound(format!("Domain {} not found", id))
}

#[async_trait]
impl DomainRepository for InMemoryDomainRepository {
    async fn create(&self, new: &NewDomain) -> Result<Domain> {
        let mut domains = self.domains.write().await;
        if domains
            .iter()
            .any(|d| d.id == new.id || d.hostname.eq_ignore_ascii_case(&new.hostname))
        {
            return Err(AppError::Conflict(
                "Domain with this id or hostname already exists".to_string(),
            ));
        }

        let first = domains.is_empty();
        let has_default = domains.iter().any(|d| d.is_default);
        let now = Utc::now();
        let domain = Domain {
            id: new.id.clone(),
            hostname: new.hostname.to_lowercase(),
            name: new.name.clone(),
            scheme: new.scheme,
            weight: new.weight,
            status: if first { DomainStatus::Active } else { new.status },
            is_default: first || (new.is_default && !has_default),
            created_at: now,
            updated_at: now,
        };
        domains.push(domain.clone());
        Ok(domain)
    }

    async fn find_by_id(&self, id: &DomainId) -> Result<Option<Domain>> {
        let domains = self.domains.read().await;
        Ok(domains.iter().find(|d| &d.id == id).cloned())
    }

    async fn find_by_hostname(&self, hostname: &str) -> Result<Option<Domain>> {
        let domains = self.domains.read().await;
        Ok(domains.iter().find(|d| d.matches_host(hostname)).cloned())
    }

    async fn list(&self) -> Result<Vec<Domain>> {
        let mut domains = self.domains.read().await.clone();
        domains.sort_by(|a, b| a.weight.cmp(&b.weight).then_with(|| a.id.cmp(&b.id)));
        Ok(domains)
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.domains.read().await.len() as i64)
    }

    async fn update(&self, id: &DomainId, input: &UpdateDomainInput) -> Result<Domain> {
        let mut domains = self.domains.write().await;
        if let Some(hostname) = &input.hostname {
            if domains
                .iter()
                .any(|d| &d.id != id && d.hostname.eq_ignore_ascii_case(hostname))
            {
                return Err(AppError::Conflict(
                    "Domain with this hostname already exists".to_string(),
                ));
            }
        }

        let domain = domains
            .iter_mut()
            .find(|d| &d.id == id)
            .ok_or_else(|| not_found(id))?;
        if let Some(hostname) = &input.hostname {
            domain.hostname = hostname.to_lowercase();
        }
        if let Some(name) = &input.name {
            domain.name = name.clone();
        }
        if let Some(scheme) = input.scheme {
            domain.scheme = scheme;
        }
        if let Some(weight) = input.weight {
            domain.weight = weight;
        }
        domain.updated_at = Utc::now();
        Ok(domain.clone())
    }

    async fn set_status(&self, id: &DomainId, status: DomainStatus) -> Result<Domain> {
        let mut domains = self.domains.write().await;
        let domain = domains
            .iter_mut()
            .find(|d| &d.id == id)
            .ok_or_else(|| not_found(id))?;
        if domain.status != status {
            domain.status = status;
            domain.updated_at = Utc::now();
        }
        Ok(domain.clone())
    }

    async fn set_default(&self, id: &DomainId) -> Result<()> {
        // A single write guard covers both the clear and the set.
        let mut domains = self.domains.write().await;
        if !domains.iter().any(|d| &d.id == id) {
            return Err(not_found(id));
        }
        for domain in domains.iter_mut() {
            domain.is_default = &domain.id == id;
        }
        Ok(())
    }

    async fn delete(&self, id: &DomainId) -> Result<()> {
        let mut domains = self.domains.write().await;
        let position = domains
            .iter()
            .position(|d| &d.id == id)
            .ok_or_else(|| not_found(id))?;
        if domains[position].is_default && domains.len() > 1 {
            return Err(AppError::InvariantViolation(format!(
                "Domain {} is the default; set another default before deleting it",
                id
            )));
        }
        domains.remove(position);
        Ok(())
    }
}

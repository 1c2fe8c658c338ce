//! Domain repository

use crate::domain::{Domain, DomainId, DomainStatus, NewDomain, UpdateDomainInput};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

/// Storage behind the domain registry.
///
/// Implementations enforce uniqueness of `id` and `hostname` and make
/// `set_default` a single atomic switch. They also hold the default-domain
/// rules when several processes share storage: `create` makes the first row
/// the default and never adds a second default, and `delete` refuses to
/// remove the default while other rows remain.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DomainRepository: Send + Sync {
    async fn create(&self, domain: &NewDomain) -> Result<Domain>;
    async fn find_by_id(&self, id: &DomainId) -> Result<Option<Domain>>;
    async fn find_by_hostname(&self, hostname: &str) -> Result<Option<Domain>>;
    /// All domains ordered by weight, then id
    async fn list(&self) -> Result<Vec<Domain>>;
    async fn count(&self) -> Result<i64>;
    async fn update(&self, id: &DomainId, input: &UpdateDomainInput) -> Result<Domain>;
    async fn set_status(&self, id: &DomainId, status: DomainStatus) -> Result<Domain>;
    /// Clear the previous default and mark `id` default in one step
    async fn set_default(&self, id: &DomainId) -> Result<()>;
    async fn delete(&self, id: &DomainId) -> Result<()>;
}

pub struct DomainRepositoryImpl {
    pool: MySqlPool,
}

impl DomainRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str =
    "SELECT id, hostname, name, scheme, weight, status, is_default, created_at, updated_at FROM domains";

/// SQLSTATE MySQL reports for deadlocks and serialization failures
const SERIALIZATION_FAILURE: &str = "40001";

fn map_unique_violation(err: sqlx::Error, what: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(format!("Domain with {} already exists", what))
        }
        sqlx::Error::Database(db) if db.code().as_deref() == Some(SERIALIZATION_FAILURE) => {
            AppError::Conflict("Concurrent domain write, retry the request".to_string())
        }
        _ => AppError::Database(err),
    }
}

fn default_delete_rejected(id: &DomainId) -> AppError {
    AppError::InvariantViolation(format!(
        "Domain {} is the default; set another default before deleting it",
        id
    ))
}

#[async_trait]
impl DomainRepository for DomainRepositoryImpl {
    async fn create(&self, domain: &NewDomain) -> Result<Domain> {
        let mut tx = self.pool.begin().await?;

        // Locks every row plus the gap, so concurrent creates serialize here
        let rows: Vec<(DomainId, bool)> =
            sqlx::query_as("SELECT id, is_default FROM domains FOR UPDATE")
                .fetch_all(&mut *tx)
                .await
                .map_err(|e| map_unique_violation(e, "this id or hostname"))?;
        let has_default = rows.iter().any(|(_, is_default)| *is_default);
        let is_default = rows.is_empty() || (domain.is_default && !has_default);
        let status = if rows.is_empty() {
            DomainStatus::Active
        } else {
            domain.status
        };

        sqlx::query(
            r#"
            INSERT INTO domains (id, hostname, name, scheme, weight, status, is_default, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(&domain.id)
        .bind(&domain.hostname)
        .bind(&domain.name)
        .bind(domain.scheme.as_str())
        .bind(domain.weight)
        .bind(status.as_str())
        .bind(is_default)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, "this id or hostname"))?;

        tx.commit().await?;

        self.find_by_id(&domain.id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create domain")))
    }

    async fn find_by_id(&self, id: &DomainId) -> Result<Option<Domain>> {
        let domain = sqlx::query_as::<_, Domain>(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(domain)
    }

    async fn find_by_hostname(&self, hostname: &str) -> Result<Option<Domain>> {
        let domain =
            sqlx::query_as::<_, Domain>(&format!("{} WHERE hostname = ?", SELECT_COLUMNS))
                .bind(hostname.to_lowercase())
                .fetch_optional(&self.pool)
                .await?;

        Ok(domain)
    }

    async fn list(&self) -> Result<Vec<Domain>> {
        let domains =
            sqlx::query_as::<_, Domain>(&format!("{} ORDER BY weight ASC, id ASC", SELECT_COLUMNS))
                .fetch_all(&self.pool)
                .await?;

        Ok(domains)
    }

    async fn count(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM domains")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    async fn update(&self, id: &DomainId, input: &UpdateDomainInput) -> Result<Domain> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Domain {} not found", id)))?;

        let hostname = input.hostname.as_ref().unwrap_or(&existing.hostname);
        let name = input.name.as_ref().unwrap_or(&existing.name);
        let scheme = input.scheme.unwrap_or(existing.scheme);
        let weight = input.weight.unwrap_or(existing.weight);

        sqlx::query(
            r#"
            UPDATE domains
            SET hostname = ?, name = ?, scheme = ?, weight = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(hostname)
        .bind(name)
        .bind(scheme.as_str())
        .bind(weight)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "this hostname"))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to update domain")))
    }

    async fn set_status(&self, id: &DomainId, status: DomainStatus) -> Result<Domain> {
        let result = sqlx::query("UPDATE domains SET status = ?, updated_at = NOW() WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        // MySQL reports zero affected rows when the value is unchanged
        if result.rows_affected() == 0 && self.find_by_id(id).await?.is_none() {
            return Err(AppError::NotFound(format!("Domain {} not found", id)));
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Domain {} not found", id)))
    }

    async fn set_default(&self, id: &DomainId) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<(DomainId,)> =
            sqlx::query_as("SELECT id FROM domains WHERE id = ? FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(AppError::NotFound(format!("Domain {} not found", id)));
        }

        sqlx::query(
            r#"
            UPDATE domains
            SET is_default = (id = ?), updated_at = NOW()
            WHERE is_default = 1 OR id = ?
            "#,
        )
        .bind(id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: &DomainId) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let rows: Vec<(DomainId, bool)> =
            sqlx::query_as("SELECT id, is_default FROM domains FOR UPDATE")
                .fetch_all(&mut *tx)
                .await?;
        let target = rows
            .iter()
            .find(|(row_id, _)| row_id == id)
            .ok_or_else(|| AppError::NotFound(format!("Domain {} not found", id)))?;
        if target.1 && rows.len() > 1 {
            return Err(default_delete_rejected(id));
        }

        sqlx::query("DELETE FROM domains WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

//! `PostgreSQL` pass repository.
//!
//! Stores access passes in `access_passes`. Only hashes are persisted.

use canteen_auth::providers::{PassRepository, RepoFuture};
use canteen_auth::state::{NewPass, Pass, PassId};
use canteen_auth::{AccessError, Result};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

const PASS_COLUMNS: &str =
    "id, secret_hash, owner_label, created_at, expires_at, is_active, used_at, use_count";

/// `PostgreSQL` implementation of [`PassRepository`].
#[derive(Clone, Debug)]
pub struct PostgresPassRepository {
    pool: PgPool,
}

impl PostgresPassRepository {
    /// Create a repository over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn db_error(e: sqlx::Error) -> AccessError {
    AccessError::DatabaseError(e.to_string())
}

fn pass_from_row(row: &PgRow) -> Result<Pass> {
    let use_count: i32 = row.try_get("use_count").map_err(db_error)?;
    Ok(Pass {
        id: PassId(row.try_get("id").map_err(db_error)?),
        secret_hash: row.try_get("secret_hash").map_err(db_error)?,
        owner_label: row.try_get("owner_label").map_err(db_error)?,
        created_at: row.try_get("created_at").map_err(db_error)?,
        expires_at: row.try_get("expires_at").map_err(db_error)?,
        is_active: row.try_get("is_active").map_err(db_error)?,
        used_at: row.try_get("used_at").map_err(db_error)?,
        use_count: u32::try_from(use_count)
            .map_err(|_| AccessError::DatabaseError(format!("negative use_count {use_count}")))?,
    })
}

/// Escape `LIKE` metacharacters so a search term matches literally.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

impl PassRepository for PostgresPassRepository {
    fn insert(&self, pass: NewPass) -> RepoFuture<'_, Pass> {
        Box::pin(async move {
            let sql = format!(
                "INSERT INTO access_passes (secret_hash, owner_label, created_at, expires_at)
                 VALUES ($1, $2, $3, $4)
                 RETURNING {PASS_COLUMNS}"
            );
            let row = sqlx::query(&sql)
                .bind(&pass.secret_hash)
                .bind(&pass.owner_label)
                .bind(pass.created_at)
                .bind(pass.expires_at)
                .fetch_one(&self.pool)
                .await
                .map_err(db_error)?;
            pass_from_row(&row)
        })
    }

    fn get(&self, id: PassId) -> RepoFuture<'_, Option<Pass>> {
        Box::pin(async move {
            let sql = format!("SELECT {PASS_COLUMNS} FROM access_passes WHERE id = $1");
            let row = sqlx::query(&sql)
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;
            row.as_ref().map(pass_from_row).transpose()
        })
    }

    fn list_active(&self) -> RepoFuture<'_, Vec<Pass>> {
        Box::pin(async move {
            let sql =
                format!("SELECT {PASS_COLUMNS} FROM access_passes WHERE is_active ORDER BY id");
            let rows = sqlx::query(&sql)
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?;
            rows.iter().map(pass_from_row).collect()
        })
    }

    fn record_use(&self, id: PassId, now: DateTime<Utc>) -> RepoFuture<'_, Pass> {
        Box::pin(async move {
            // Increment in SQL so concurrent verifications never lose a count.
            let sql = format!(
                "UPDATE access_passes
                 SET use_count = use_count + 1, used_at = $2
                 WHERE id = $1
                 RETURNING {PASS_COLUMNS}"
            );
            let row = sqlx::query(&sql)
                .bind(id.0)
                .bind(now)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?
                .ok_or(AccessError::PassNotFound)?;
            pass_from_row(&row)
        })
    }

    fn replace_secret(
        &self,
        id: PassId,
        secret_hash: String,
        expires_at: Option<DateTime<Utc>>,
    ) -> RepoFuture<'_, Pass> {
        Box::pin(async move {
            let sql = format!(
                "UPDATE access_passes
                 SET secret_hash = $2, expires_at = $3, use_count = 0, is_active = TRUE
                 WHERE id = $1
                 RETURNING {PASS_COLUMNS}"
            );
            let row = sqlx::query(&sql)
                .bind(id.0)
                .bind(&secret_hash)
                .bind(expires_at)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?
                .ok_or(AccessError::PassNotFound)?;
            pass_from_row(&row)
        })
    }

    fn set_active(&self, id: PassId, active: bool) -> RepoFuture<'_, Pass> {
        Box::pin(async move {
            let sql = format!(
                "UPDATE access_passes SET is_active = $2 WHERE id = $1 RETURNING {PASS_COLUMNS}"
            );
            let row = sqlx::query(&sql)
                .bind(id.0)
                .bind(active)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?
                .ok_or(AccessError::PassNotFound)?;
            pass_from_row(&row)
        })
    }

    fn search(&self, query: Option<String>) -> RepoFuture<'_, Vec<Pass>> {
        Box::pin(async move {
            let pattern = query
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(like_pattern);
            let sql = format!(
                "SELECT {PASS_COLUMNS} FROM access_passes
                 WHERE $1::TEXT IS NULL OR owner_label ILIKE $1
                 ORDER BY created_at DESC, id DESC"
            );
            let rows = sqlx::query(&sql)
                .bind(pattern)
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?;
            rows.iter().map(pass_from_row).collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("ann"), "%ann%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}

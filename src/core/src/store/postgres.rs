//! PostgreSQL permission store.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::debug;

use super::{NewPermission, PermissionRow, PermissionStore};
use crate::error::Result;

/// Takes the table name as plain text, so it works on servers where
/// `to_regclass` only accepts `cstring`.
const TABLE_EXISTS_SQL: &str = "SELECT EXISTS (SELECT 1 FROM information_schema.tables \
     WHERE table_schema = current_schema() AND table_name = $1)";

/// Permissions table in PostgreSQL.
#[derive(Clone)]
pub struct PgPermissionStore {
    pool: PgPool,
    table: String,
}

impl PgPermissionStore {
    /// `table` must already be a validated identifier.
    pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }

    /// Get the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PermissionStore for PgPermissionStore {
    async fn table_exists(&self) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(TABLE_EXISTS_SQL)
            .bind(&self.table)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn insert_if_absent(&self, permission: &NewPermission) -> Result<bool> {
        let now = Utc::now().naive_utc();

        let result = match &permission.group {
            Some(group) => {
                sqlx::query(&format!(
                    r#"
                    INSERT INTO {table} (name, guard_name, "group", created_at, updated_at)
                    SELECT $1, $2, $3, $4, $4
                    WHERE NOT EXISTS (
                        SELECT 1 FROM {table} WHERE name = $1 AND guard_name = $2
                    )
                    "#,
                    table = self.table
                ))
                .bind(&permission.name)
                .bind(&permission.guard_name)
                .bind(group)
                .bind(now)
                .execute(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    r#"
                    INSERT INTO {table} (name, guard_name, created_at, updated_at)
                    SELECT $1, $2, $3, $3
                    WHERE NOT EXISTS (
                        SELECT 1 FROM {table} WHERE name = $1 AND guard_name = $2
                    )
                    "#,
                    table = self.table
                ))
                .bind(&permission.name)
                .bind(&permission.guard_name)
                .bind(now)
                .execute(&self.pool)
                .await?
            }
        };

        let created = result.rows_affected() > 0;
        debug!(name = %permission.name, guard = %permission.guard_name, created, "Permission upserted");
        Ok(created)
    }

    async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query(&format!("DELETE FROM {}", self.table))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn reset_sequence(&self) -> Result<()> {
        sqlx::query(&format!("ALTER SEQUENCE {}_id_seq RESTART WITH 1", self.table))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", self.table))
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn list(&self) -> Result<Vec<PermissionRow>> {
        let rows = sqlx::query_as::<_, PermissionRow>(&format!(
            "SELECT * FROM {} ORDER BY id",
            self.table
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

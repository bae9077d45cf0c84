//! MySQL / MariaDB permission store.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::MySqlPool;
use tracing::debug;

use super::{NewPermission, PermissionRow, PermissionStore};
use crate::error::Result;

/// Permissions table in MySQL or MariaDB.
#[derive(Clone)]
pub struct MySqlPermissionStore {
    pool: MySqlPool,
    table: String,
}

impl MySqlPermissionStore {
    /// `table` must already be a validated identifier.
    pub fn new(pool: MySqlPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    async fn has_column(&self, column: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM information_schema.columns \
             WHERE table_schema = DATABASE() AND table_name = ? AND column_name = ?",
        )
        .bind(&self.table)
        .bind(column)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }
}

#[async_trait]
impl PermissionStore for MySqlPermissionStore {
    async fn table_exists(&self) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM information_schema.tables \
             WHERE table_schema = DATABASE() AND table_name = ?",
        )
        .bind(&self.table)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    async fn insert_if_absent(&self, permission: &NewPermission) -> Result<bool> {
        let now = Utc::now().naive_utc();

        // Positional `?` parameters cannot be reused, so name and guard are bound twice.
        let result = match &permission.group {
            Some(group) => {
                sqlx::query(&format!(
                    r#"
                    INSERT INTO `{table}` (name, guard_name, `group`, created_at, updated_at)
                    SELECT ?, ?, ?, ?, ? FROM DUAL
                    WHERE NOT EXISTS (
                        SELECT 1 FROM `{table}` WHERE name = ? AND guard_name = ?
                    )
                    "#,
                    table = self.table
                ))
                .bind(&permission.name)
                .bind(&permission.guard_name)
                .bind(group)
                .bind(now)
                .bind(now)
                .bind(&permission.name)
                .bind(&permission.guard_name)
                .execute(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    r#"
                    INSERT INTO `{table}` (name, guard_name, created_at, updated_at)
                    SELECT ?, ?, ?, ? FROM DUAL
                    WHERE NOT EXISTS (
                        SELECT 1 FROM `{table}` WHERE name = ? AND guard_name = ?
                    )
                    "#,
                    table = self.table
                ))
                .bind(&permission.name)
                .bind(&permission.guard_name)
                .bind(now)
                .bind(now)
                .bind(&permission.name)
                .bind(&permission.guard_name)
                .execute(&self.pool)
                .await?
            }
        };

        let created = result.rows_affected() > 0;
        debug!(name = %permission.name, guard = %permission.guard_name, created, "Permission upserted");
        Ok(created)
    }

    async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query(&format!("DELETE FROM `{}`", self.table))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn reset_sequence(&self) -> Result<()> {
        sqlx::query(&format!("ALTER TABLE `{}` AUTO_INCREMENT = 1", self.table))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM `{}`", self.table))
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn list(&self) -> Result<Vec<PermissionRow>> {
        // Ids are usually BIGINT UNSIGNED; cast so they decode as i64.
        let group = if self.has_column("group").await? {
            ", `group`"
        } else {
            ""
        };
        let rows = sqlx::query_as::<_, PermissionRow>(&format!(
            "SELECT CAST(id AS SIGNED) AS id, name, guard_name{group}, created_at, updated_at \
             FROM `{table}` ORDER BY id",
            group = group,
            table = self.table
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    fn name(&self) -> &'static str {
        "mysql"
    }
}

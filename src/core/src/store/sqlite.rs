//! SQLite permission store.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use super::{NewPermission, PermissionRow, PermissionStore};
use crate::error::Result;

/// Permissions table in SQLite.
#[derive(Clone)]
pub struct SqlitePermissionStore {
    pool: SqlitePool,
    table: String,
}

impl SqlitePermissionStore {
    /// `table` must already be a validated identifier.
    pub fn new(pool: SqlitePool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }

    /// Get the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn has_table(&self, name: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }
}

#[async_trait]
impl PermissionStore for SqlitePermissionStore {
    async fn table_exists(&self) -> Result<bool> {
        self.has_table(&self.table).await
    }

    async fn insert_if_absent(&self, permission: &NewPermission) -> Result<bool> {
        let now = Utc::now().naive_utc();

        let result = match &permission.group {
            Some(group) => {
                sqlx::query(&format!(
                    r#"
                    INSERT INTO {table} (name, guard_name, "group", created_at, updated_at)
                    SELECT ?1, ?2, ?3, ?4, ?4
                    WHERE NOT EXISTS (
                        SELECT 1 FROM {table} WHERE name = ?1 AND guard_name = ?2
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
                    SELECT ?1, ?2, ?3, ?3
                    WHERE NOT EXISTS (
                        SELECT 1 FROM {table} WHERE name = ?1 AND guard_name = ?2
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

    /// SQLite keeps AUTOINCREMENT counters in `sqlite_sequence`, which only
    /// exists once some table uses AUTOINCREMENT.
    async fn reset_sequence(&self) -> Result<()> {
        if !self.has_table("sqlite_sequence").await? {
            return Ok(());
        }
        sqlx::query("DELETE FROM sqlite_sequence WHERE name = ?1")
            .bind(&self.table)
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
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn store(with_group: bool) -> SqlitePermissionStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let group = if with_group { "\"group\" TEXT NULL," } else { "" };
        sqlx::query(&format!(
            "CREATE TABLE permissions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                guard_name TEXT NOT NULL,
                {group}
                created_at TIMESTAMP NULL,
                updated_at TIMESTAMP NULL,
                UNIQUE (name, guard_name)
            )"
        ))
        .execute(&pool)
        .await
        .unwrap();
        SqlitePermissionStore::new(pool, "permissions")
    }

    #[tokio::test]
    async fn test_insert_if_absent_is_idempotent() {
        let store = store(false).await;
        let permission = NewPermission::new("Order.view", "web");

        assert!(store.insert_if_absent(&permission).await.unwrap());
        assert!(!store.insert_if_absent(&permission).await.unwrap());
        assert!(store
            .insert_if_absent(&NewPermission::new("Order.view", "api"))
            .await
            .unwrap());
        assert_eq!(store.count().await.unwrap(), 2);

        let rows = store.list().await.unwrap();
        assert_eq!(rows[0].name, "Order.view");
        assert_eq!(rows[0].guard_name, "web");
        assert_eq!(rows[0].group, None);
        assert!(rows[0].created_at.is_some());
    }

    #[tokio::test]
    async fn test_group_column_is_written() {
        let store = store(true).await;
        let permission = NewPermission::new("Order.view", "web").with_group(Some("Order".into()));
        store.insert_if_absent(&permission).await.unwrap();

        let rows = store.list().await.unwrap();
        assert_eq!(rows[0].group.as_deref(), Some("Order"));
    }

    #[tokio::test]
    async fn test_delete_all_and_reset_sequence() {
        let store = store(false).await;
        assert!(store.table_exists().await.unwrap());
        for guard in ["web", "api"] {
            store
                .insert_if_absent(&NewPermission::new("Order.view", guard))
                .await
                .unwrap();
        }

        assert_eq!(store.delete_all().await.unwrap(), 2);
        store.reset_sequence().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);

        store
            .insert_if_absent(&NewPermission::new("Order.create", "web"))
            .await
            .unwrap();
        assert_eq!(store.list().await.unwrap()[0].id, 1);
    }

    #[tokio::test]
    async fn test_missing_table() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqlitePermissionStore::new(pool, "permissions");
        assert!(!store.table_exists().await.unwrap());
        store.reset_sequence().await.unwrap();
    }
}

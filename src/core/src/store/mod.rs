//! Permission storage.
//!
//! The synchronizer only needs a handful of operations on the permissions
//! table, expressed by [`PermissionStore`]. PostgreSQL, MySQL/MariaDB and
//! SQLite implementations are provided; [`connect`] picks one from the
//! database URL.

pub mod mysql;
pub mod postgres;
pub mod sqlite;

pub use mysql::MySqlPermissionStore;
pub use postgres::PgPermissionStore;
pub use sqlite::SqlitePermissionStore;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::SqlitePoolOptions;
use std::time::Duration;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::{EnumPermError, ErrorCode, Result};
use crate::telemetry::redact_database_url;

// ═══════════════════════════════════════════════════════════════════════════════
// Row Types
// ═══════════════════════════════════════════════════════════════════════════════

/// A row of the permissions table.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct PermissionRow {
    pub id: i64,
    pub name: String,
    pub guard_name: String,
    /// Absent when the table has no `group` column.
    #[sqlx(default)]
    pub group: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

/// A permission to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPermission {
    pub name: String,
    pub guard_name: String,
    /// Written to the `group` column only when set.
    pub group: Option<String>,
}

impl NewPermission {
    pub fn new(name: impl Into<String>, guard_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            guard_name: guard_name.into(),
            group: None,
        }
    }

    pub fn with_group(mut self, group: Option<String>) -> Self {
        self.group = group;
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Store Trait
// ═══════════════════════════════════════════════════════════════════════════════

/// Operations on the permissions table.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Whether the permissions table exists.
    async fn table_exists(&self) -> Result<bool>;

    /// Insert `permission` unless a row with the same name and guard exists.
    /// Existing rows are never modified. Returns whether a row was created.
    async fn insert_if_absent(&self, permission: &NewPermission) -> Result<bool>;

    /// Delete every row, returning how many were removed.
    async fn delete_all(&self) -> Result<u64>;

    /// Restart the id sequence at 1, where the backend has one.
    async fn reset_sequence(&self) -> Result<()>;

    /// Number of rows.
    async fn count(&self) -> Result<u64>;

    /// All rows ordered by id.
    async fn list(&self) -> Result<Vec<PermissionRow>>;

    /// Backend name.
    fn name(&self) -> &'static str;
}

// ═══════════════════════════════════════════════════════════════════════════════
// Connection
// ═══════════════════════════════════════════════════════════════════════════════

/// Database family selected by URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    Postgres,
    MySql,
    Sqlite,
}

impl DatabaseBackend {
    pub fn from_url(url: &str) -> Option<Self> {
        let scheme = url.split(':').next().unwrap_or_default();
        match scheme.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Some(Self::Postgres),
            "mysql" | "mariadb" => Some(Self::MySql),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

/// Open a store for the configured database URL.
///
/// `postgres://` and `postgresql://` URLs get a [`PgPermissionStore`],
/// `mysql://` and `mariadb://` a [`MySqlPermissionStore`], `sqlite:` URLs a
/// [`SqlitePermissionStore`].
pub async fn connect(config: &DatabaseConfig) -> Result<Box<dyn PermissionStore>> {
    let url = config.url.as_deref().ok_or_else(|| {
        EnumPermError::new(
            ErrorCode::MissingConfiguration,
            "database.url is not set (or ENUMPERM__DATABASE__URL)",
        )
    })?;

    info!(url = %redact_database_url(url), table = %config.table, "Connecting to database");

    let Some(backend) = DatabaseBackend::from_url(url) else {
        return Err(EnumPermError::with_internal(
            ErrorCode::UnsupportedDatabase,
            "Unsupported database URL; expected postgres://, mysql://, mariadb:// or sqlite:",
            redact_database_url(url),
        ));
    };

    match backend {
        DatabaseBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections.max(1))
                .acquire_timeout(Duration::from_secs(5))
                .connect(url)
                .await?;
            Ok(Box::new(PgPermissionStore::new(pool, config.table.clone())))
        }
        DatabaseBackend::MySql => {
            // sqlx only understands the mysql scheme.
            let url = match url.split_once("://") {
                Some((_, rest)) => format!("mysql://{}", rest),
                None => url.to_string(),
            };
            let pool = MySqlPoolOptions::new()
                .max_connections(config.max_connections.max(1))
                .acquire_timeout(Duration::from_secs(5))
                .connect(&url)
                .await?;
            Ok(Box::new(MySqlPermissionStore::new(pool, config.table.clone())))
        }
        DatabaseBackend::Sqlite => {
            let options = if is_sqlite_memory(url) {
                // Every connection to an in-memory database sees its own database.
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
            } else {
                SqlitePoolOptions::new().max_connections(config.max_connections.max(1))
            };
            let pool = options
                .acquire_timeout(Duration::from_secs(5))
                .connect(url)
                .await?;
            Ok(Box::new(SqlitePermissionStore::new(pool, config.table.clone())))
        }
    }
}

fn is_sqlite_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

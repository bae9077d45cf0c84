//! Permission synchronization.
//!
//! Finds permission enum files below a search root, reads their cases through
//! the source scanner, and inserts one row per guard and case into the
//! permissions table. Existing rows are left untouched, so repeated runs are
//! idempotent.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{EnumPermError, ErrorCode, IoResultExt, Result};
use crate::generator::ENUM_SUFFIX;
use crate::prompt::Prompt;
use crate::source::{file_stem, list_source_files, SourceScanner, TypeIndex};
use crate::store::{NewPermission, PermissionStore};

/// Question asked before a clean, unless forced.
pub const CLEAN_QUESTION: &str =
    "Do you want to clean the permissions? This will delete all the permissions in the database";

// ═══════════════════════════════════════════════════════════════════════════════
// Reports
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of syncing one permission file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FileOutcome {
    /// `count` guard/case pairs were processed.
    Synced { count: usize },
    Failed { code: ErrorCode, message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct FileSyncResult {
    pub path: PathBuf,
    pub class_name: String,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

impl FileSyncResult {
    /// User-facing summary line.
    pub fn message(&self) -> String {
        match &self.outcome {
            FileOutcome::Synced { count } => format!(
                "Successfully synced {} permissions for {}",
                count, self.class_name
            ),
            FileOutcome::Failed { message, .. } => message.clone(),
        }
    }
}

/// Outcome of a whole sync run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    /// Guard/case pairs processed across all files.
    pub synced: usize,
    /// Files that failed.
    pub failed: usize,
    pub files: Vec<FileSyncResult>,
    /// Rows deleted by a clean, when one ran.
    pub cleaned: Option<u64>,
    /// The clean was declined and nothing was synced.
    pub cancelled: bool,
}

impl SyncReport {
    pub fn cancelled() -> Self {
        Self {
            cancelled: true,
            ..Self::default()
        }
    }

    fn record(&mut self, result: FileSyncResult) {
        match &result.outcome {
            FileOutcome::Synced { count } => self.synced += count,
            FileOutcome::Failed { .. } => self.failed += 1,
        }
        self.files.push(result);
    }

    /// A run fails when files were attempted and every one of them failed.
    pub fn is_success(&self) -> bool {
        self.files.is_empty() || self.failed < self.files.len()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Synchronizer
// ═══════════════════════════════════════════════════════════════════════════════

/// Options for one sync run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Delete every permission before syncing.
    pub clean: bool,
    /// Clean without asking.
    pub force: bool,
}

/// Syncs permission enums into a [`PermissionStore`].
#[derive(Debug, Clone)]
pub struct PermissionSynchronizer {
    scanner: SourceScanner,
    extension: String,
    guards: Vec<String>,
    group: bool,
}

impl PermissionSynchronizer {
    /// `group` fills the `group` column with the enum name minus its
    /// `Permission` suffix.
    pub fn new(
        scanner: SourceScanner,
        extension: impl Into<String>,
        guards: Vec<String>,
        group: bool,
    ) -> Self {
        Self {
            scanner,
            extension: extension.into(),
            guards,
            group,
        }
    }

    /// Source files below `root` whose name contains `Permission`.
    pub fn find_permission_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !root.is_dir() {
            return Err(EnumPermError::new(
                ErrorCode::NoPermissionFiles,
                format!("No permission enum files found in path: {}", root.display()),
            ));
        }

        let files: Vec<PathBuf> = list_source_files(root, &self.extension)
            .into_iter()
            .filter(|path| {
                path.file_name()
                    .map(|name| name.to_string_lossy().contains(ENUM_SUFFIX))
                    .unwrap_or(false)
            })
            .collect();

        if files.is_empty() {
            return Err(EnumPermError::new(
                ErrorCode::NoPermissionFiles,
                format!("No permission enum files found in path: {}", root.display()),
            ));
        }
        Ok(files)
    }

    /// Sync every permission enum below `root`.
    ///
    /// Missing files, a missing table, and a failed clean abort the run.
    /// Problems with individual files are recorded in the report and the
    /// remaining files are still processed.
    pub async fn sync(
        &self,
        root: &Path,
        store: &dyn PermissionStore,
        options: SyncOptions,
        prompt: &mut dyn Prompt,
    ) -> Result<SyncReport> {
        let files = self.find_permission_files(root)?;

        if !store.table_exists().await? {
            return Err(EnumPermError::new(
                ErrorCode::TableMissing,
                "The permissions table does not exist; run your migrations first",
            ));
        }

        let mut report = SyncReport::default();

        if options.clean {
            if !options.force && !prompt.confirm(CLEAN_QUESTION, false)? {
                info!("Clean operation cancelled");
                return Ok(SyncReport::cancelled());
            }
            report.cleaned = Some(self.clean(store).await?);
        }

        for path in files {
            let result = self.sync_file(&path, store).await;
            match &result.outcome {
                FileOutcome::Synced { count } => {
                    info!(class = %result.class_name, count, "Synced permissions")
                }
                FileOutcome::Failed { code, message } => {
                    warn!(class = %result.class_name, path = %path.display(), %code, %message, "Permission sync failed")
                }
            }
            report.record(result);
        }

        info!(synced = report.synced, failed = report.failed, "Permissions sync complete");
        Ok(report)
    }

    /// Delete every permission and restart the id sequence.
    pub async fn clean(&self, store: &dyn PermissionStore) -> Result<u64> {
        let deleted = async {
            let deleted = store.delete_all().await?;
            store.reset_sequence().await?;
            Ok::<u64, EnumPermError>(deleted)
        }
        .await
        .map_err(|e| {
            EnumPermError::with_internal(
                ErrorCode::CleanFailed,
                "Failed to clean permissions",
                e.to_string(),
            )
            .with_source(e)
        })?;

        info!(deleted, backend = store.name(), "All permissions have been removed from the database");
        Ok(deleted)
    }

    /// Sync a single permission enum file.
    pub async fn sync_file(&self, path: &Path, store: &dyn PermissionStore) -> FileSyncResult {
        let separator = self.scanner.separator();

        let text = match std::fs::read_to_string(path).at_path(ErrorCode::FileReadFailed, path) {
            Ok(text) => text,
            Err(e) => {
                return FileSyncResult {
                    path: path.to_path_buf(),
                    class_name: file_stem(path),
                    outcome: FileOutcome::Failed {
                        code: e.code(),
                        message: format!("Failed to sync permissions: {}", e.user_message()),
                    },
                }
            }
        };

        let file = self.scanner.scan(path, &text);
        let class_name = file.expected_type_name(separator);
        let fail = |code: ErrorCode, message: String| FileSyncResult {
            path: path.to_path_buf(),
            class_name: class_name.clone(),
            outcome: FileOutcome::Failed { code, message },
        };

        let index = TypeIndex::build(separator, [&file]);
        let Some(info) = index.get(&class_name) else {
            return fail(ErrorCode::ClassNotFound, format!("Class {} not found", class_name));
        };
        if !info.is_enum() {
            return fail(ErrorCode::NotAnEnum, "Class is not an Enum class".to_string());
        }
        let values: Option<Vec<&str>> = info.cases.iter().map(|c| c.value.as_deref()).collect();
        let values = match values {
            Some(values) if info.is_string_backed() => values,
            _ => {
                return fail(
                    ErrorCode::EnumNotStringBacked,
                    format!(
                        "Failed to sync permissions: enum {} has no string values",
                        class_name
                    ),
                )
            }
        };

        let group = self
            .group
            .then(|| info.simple_name.replace(ENUM_SUFFIX, ""));

        let mut count = 0;
        for guard in &self.guards {
            for value in &values {
                let permission = NewPermission::new(*value, guard.as_str()).with_group(group.clone());
                if let Err(e) = store.insert_if_absent(&permission).await {
                    return fail(e.code(), format!("Failed to sync permissions: {}", e));
                }
                count += 1;
            }
        }

        FileSyncResult {
            path: path.to_path_buf(),
            class_name,
            outcome: FileOutcome::Synced { count },
        }
    }
}

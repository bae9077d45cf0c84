//! Integration tests for generation followed by permission sync.
//!
//! These run the full `make` then `sync` path against a scratch project tree
//! and an in-memory SQLite database.

use enumperm_core::prelude::*;
use enumperm_core::prompt::{Answer, ScriptedPrompt};
use enumperm_core::store::SqlitePermissionStore;
use enumperm_core::sync::CLEAN_QUESTION;
use sqlx::sqlite::SqlitePoolOptions;
use std::fs;
use std::path::Path;

// ============================================================================
// Test Utilities
// ============================================================================

fn project(root: &Path) -> Config {
    let mut config = Config::default();
    config.models_path = root.join("app/Models");
    config.output.policies_path = root.join("app/Policies");
    config.sync.search_path = root.join("app");
    config
}

fn write_model(root: &Path, name: &str) {
    let dir = root.join("app/Models");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join(format!("{}.php", name)),
        format!(
            "<?php\n\nnamespace App\\Models;\n\nuse Illuminate\\Database\\Eloquent\\Model;\n\nclass {} extends Model\n{{\n}}\n",
            name
        ),
    )
    .unwrap();
}

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

fn make_order(service: &PermissionService) {
    let request = MakeRequest {
        model: Some("App\\Models\\Order".to_string()),
        policy: false,
        force: false,
    };
    let report = service.make(&request, &mut AssumeNo).unwrap();
    assert_eq!(
        report.models[0].permission_enum.outcome,
        ArtifactOutcome::Generated
    );
}

// ============================================================================
// End-to-end
// ============================================================================

#[tokio::test]
async fn test_order_scenario_syncs_fourteen_rows() {
    let dir = tempfile::tempdir().unwrap();
    write_model(dir.path(), "Order");
    let service = PermissionService::new(project(dir.path())).unwrap();
    make_order(&service);

    let store = store(false).await;
    let report = service
        .sync(&SyncRequest::default(), &store, &mut AssumeNo)
        .await
        .unwrap();

    assert_eq!(report.synced, 14);
    assert_eq!(report.failed, 0);
    assert_eq!(report.files.len(), 1);
    assert_eq!(report.files[0].class_name, "App\\Permissions\\OrderPermission");
    assert_eq!(
        report.files[0].outcome,
        FileOutcome::Synced { count: 14 }
    );

    let rows = store.list().await.unwrap();
    assert_eq!(rows.len(), 14);
    let web: Vec<&str> = rows
        .iter()
        .filter(|r| r.guard_name == "web")
        .map(|r| r.name.as_str())
        .collect();
    assert_eq!(
        web,
        vec![
            "Order.viewAny",
            "Order.view",
            "Order.create",
            "Order.update",
            "Order.delete",
            "Order.restore",
            "Order.forceDelete",
        ]
    );
    assert_eq!(rows.iter().filter(|r| r.guard_name == "api").count(), 7);
}

#[tokio::test]
async fn test_sync_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    write_model(dir.path(), "Order");
    write_model(dir.path(), "Product");
    let service = PermissionService::new(project(dir.path())).unwrap();
    service
        .make(&MakeRequest::default(), &mut AssumeYes)
        .unwrap();

    let store = store(false).await;
    for _ in 0..2 {
        let report = service
            .sync(&SyncRequest::default(), &store, &mut AssumeNo)
            .await
            .unwrap();
        assert_eq!(report.synced, 28);
    }
    assert_eq!(store.count().await.unwrap(), 28);
}

#[tokio::test]
async fn test_sync_with_groups() {
    let dir = tempfile::tempdir().unwrap();
    write_model(dir.path(), "Order");
    let mut config = project(dir.path());
    config.sync_permission_group = true;
    config.guards = vec!["web".to_string()];
    let service = PermissionService::new(config).unwrap();
    make_order(&service);

    let store = store(true).await;
    service
        .sync(&SyncRequest::default(), &store, &mut AssumeNo)
        .await
        .unwrap();

    let rows = store.list().await.unwrap();
    assert_eq!(rows.len(), 7);
    assert!(rows.iter().all(|r| r.group.as_deref() == Some("Order")));
}

// ============================================================================
// Clean
// ============================================================================

#[tokio::test]
async fn test_forced_clean_empties_table_before_sync() {
    let dir = tempfile::tempdir().unwrap();
    write_model(dir.path(), "Order");
    let service = PermissionService::new(project(dir.path())).unwrap();
    make_order(&service);

    let store = store(false).await;
    store
        .insert_if_absent(&enumperm_core::store::NewPermission::new("Legacy.view", "web"))
        .await
        .unwrap();

    let request = SyncRequest {
        clean: true,
        path: None,
        force: true,
    };
    let report = service.sync(&request, &store, &mut AssumeNo).await.unwrap();

    assert_eq!(report.cleaned, Some(1));
    let rows = store.list().await.unwrap();
    assert_eq!(rows.len(), 14);
    assert!(rows.iter().all(|r| r.name != "Legacy.view"));
    assert_eq!(rows[0].id, 1);
}

#[tokio::test]
async fn test_clean_leaves_zero_rows() {
    let store = store(false).await;
    for guard in ["web", "api"] {
        store
            .insert_if_absent(&enumperm_core::store::NewPermission::new("Order.view", guard))
            .await
            .unwrap();
    }

    let sync = PermissionService::new(Config::default()).unwrap().synchronizer();
    assert_eq!(sync.clean(&store).await.unwrap(), 2);
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_declined_clean_cancels_the_run() {
    let dir = tempfile::tempdir().unwrap();
    write_model(dir.path(), "Order");
    let service = PermissionService::new(project(dir.path())).unwrap();
    make_order(&service);

    let store = store(false).await;
    store
        .insert_if_absent(&enumperm_core::store::NewPermission::new("Legacy.view", "web"))
        .await
        .unwrap();

    let mut prompt = ScriptedPrompt::new([Answer::Confirm(false)]);
    let request = SyncRequest {
        clean: true,
        path: None,
        force: false,
    };
    let report = service.sync(&request, &store, &mut prompt).await.unwrap();

    assert!(report.cancelled);
    assert!(report.is_success());
    assert_eq!(prompt.asked(), &[CLEAN_QUESTION.to_string()]);
    assert_eq!(store.count().await.unwrap(), 1);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_non_enum_permission_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let permissions = dir.path().join("app/Permissions");
    fs::create_dir_all(&permissions).unwrap();
    fs::write(
        permissions.join("InvoicePermission.php"),
        "<?php\n\nnamespace App\\Permissions;\n\nclass InvoicePermission\n{\n}\n",
    )
    .unwrap();
    fs::write(
        permissions.join("OrderPermission.php"),
        "<?php\n\nnamespace App\\Permissions;\n\nenum OrderPermission: string\n{\n    case VIEW = 'Order.view';\n}\n",
    )
    .unwrap();

    let service = PermissionService::new(project(dir.path())).unwrap();
    let store = store(false).await;
    let report = service
        .sync(&SyncRequest::default(), &store, &mut AssumeNo)
        .await
        .unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.synced, 2);
    assert_eq!(
        report.files[0].outcome,
        FileOutcome::Failed {
            code: ErrorCode::NotAnEnum,
            message: "Class is not an Enum class".to_string()
        }
    );
    assert!(report.is_success());
    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_pure_enum_and_missing_class_fail() {
    let dir = tempfile::tempdir().unwrap();
    let permissions = dir.path().join("app/Permissions");
    fs::create_dir_all(&permissions).unwrap();
    fs::write(
        permissions.join("StatusPermission.php"),
        "<?php namespace App\\Permissions; enum StatusPermission { case OPEN; }",
    )
    .unwrap();
    fs::write(
        permissions.join("TypoPermission.php"),
        "<?php namespace App\\Permissions; enum TypoPermissions: string { case A = 'a'; }",
    )
    .unwrap();

    let service = PermissionService::new(project(dir.path())).unwrap();
    let store = store(false).await;
    let report = service
        .sync(&SyncRequest::default(), &store, &mut AssumeNo)
        .await
        .unwrap();

    let codes: Vec<ErrorCode> = report
        .files
        .iter()
        .filter_map(|f| match &f.outcome {
            FileOutcome::Failed { code, .. } => Some(*code),
            FileOutcome::Synced { .. } => None,
        })
        .collect();
    assert_eq!(
        codes,
        vec![ErrorCode::EnumNotStringBacked, ErrorCode::ClassNotFound]
    );

    let messages: Vec<String> = report.files.iter().map(|f| f.message()).collect();
    assert_eq!(
        messages,
        vec![
            "Failed to sync permissions: enum App\\Permissions\\StatusPermission has no string values"
                .to_string(),
            "Class App\\Permissions\\TypoPermission not found".to_string(),
        ]
    );
    assert!(!report.is_success());
}

#[tokio::test]
async fn test_no_permission_files_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("app")).unwrap();
    let service = PermissionService::new(project(dir.path())).unwrap();
    let store = store(false).await;

    let err = service
        .sync(&SyncRequest::default(), &store, &mut AssumeNo)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoPermissionFiles);
}

#[tokio::test]
async fn test_missing_table_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write_model(dir.path(), "Order");
    let service = PermissionService::new(project(dir.path())).unwrap();
    make_order(&service);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let store = SqlitePermissionStore::new(pool, "permissions");

    let err = service
        .sync(&SyncRequest::default(), &store, &mut AssumeNo)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::TableMissing);
}

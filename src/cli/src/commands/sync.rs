//! `sync`: write the generated permission names to the permissions table.

use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;

use enumperm_core::service::SyncRequest;
use enumperm_core::store;
use enumperm_core::sync::{FileOutcome, SyncReport};
use enumperm_core::PermissionService;

use crate::output::{self, OutputFormat};
use crate::prompt::TerminalPrompt;

/// Fallback connection URL when `database.url` is not configured.
const DATABASE_URL_ENV: &str = "DATABASE_URL";

#[derive(Args)]
pub struct SyncArgs {
    /// Remove every permission before syncing
    #[arg(short, long)]
    pub clean: bool,

    /// Directory searched for permission enums (defaults to `sync.search_path`)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Clean without asking for confirmation
    #[arg(short, long)]
    pub force: bool,
}

pub async fn execute(args: SyncArgs, service: &PermissionService, format: OutputFormat) -> Result<()> {
    if format.is_human() {
        output::print_info("Syncing Permissions...");
    }

    // Report missing permission enums before requiring a database.
    let root = args
        .path
        .as_deref()
        .unwrap_or(service.config().sync.search_path.as_path());
    service.synchronizer().find_permission_files(root)?;

    let mut database = service.config().database.clone();
    if database.url.is_none() {
        database.url = std::env::var(DATABASE_URL_ENV).ok();
    }
    let store = store::connect(&database).await?;

    let request = SyncRequest {
        clean: args.clean,
        path: args.path,
        force: args.force,
    };
    let report = service
        .sync(&request, store.as_ref(), &mut TerminalPrompt::new())
        .await?;

    if format.is_human() {
        print_report(&report);
    } else {
        output::print_item(&report, format);
    }

    if !report.is_success() {
        bail!("No permission enum could be synced");
    }
    Ok(())
}

fn print_report(report: &SyncReport) {
    if report.cancelled {
        output::print_info("Clean operation cancelled");
        return;
    }
    if report.cleaned.is_some() {
        output::print_info("All permissions have been removed from the database");
    }
    for file in &report.files {
        output::print_info(&format!("Processing {}", file.path.display()));
        match &file.outcome {
            FileOutcome::Synced { .. } => output::print_success(&file.message()),
            FileOutcome::Failed { .. } => output::print_warn(&file.message()),
        }
    }
    output::print_info(&format!(
        "Permissions sync complete. Synced: {}, Failed: {}",
        report.synced, report.failed
    ));
}

//! enumperm CLI - generate permission enums and policies, sync permissions.
//!
//! Provides the `make`, `sync`, `models` and `config` commands.

mod commands;
mod output;
mod prompt;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use commands::{config, make, models, sync};
use enumperm_core::error::{EnumPermError, ErrorSeverity};
use enumperm_core::telemetry::{init_logging, LoggingConfig};
use enumperm_core::{Config, PermissionService};
use output::OutputFormat;

/// enumperm - permission enum, policy and permission sync tooling
#[derive(Parser)]
#[command(
    name = "enumperm",
    version,
    about = "Generate permission enums and policies, and sync permissions to the database",
    long_about = "Scans application models, generates one permission enum (and optionally one policy) per model from templates, and syncs the generated permission names into the permissions table.",
    propagate_version = true
)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    output: OutputFormat,

    /// Configuration file (defaults to ./enumperm.toml when present)
    #[arg(long, global = true, env = "ENUMPERM_CONFIG")]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate permission enums (and policies) for models
    Make(make::MakeArgs),

    /// Sync permission enums to the permissions table
    Sync(sync::SyncArgs),

    /// List discovered models
    Models,

    /// Configuration management
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }
    dotenvy::dotenv().ok();

    let format = cli.output;
    let result = run(cli, format).await;

    if let Err(e) = result {
        match e.downcast_ref::<EnumPermError>() {
            Some(err) => {
                err.log();
                if err.severity() == ErrorSeverity::Low {
                    output::print_warn(err.user_message());
                } else {
                    output::print_error(&format!("{:#}", e));
                }
            }
            None => output::print_error(&format!("{:#}", e)),
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli, format: OutputFormat) -> Result<()> {
    // `config init` must work without a valid configuration.
    if let Commands::Config(config::ConfigCommands::Init { path, force }) = &cli.command {
        init_logging(&logging_for(LoggingConfig::default(), cli.verbose))?;
        return config::init(path, *force, format);
    }

    let cfg = Config::load(cli.config.as_deref())?;
    init_logging(&logging_for(cfg.logging.clone(), cli.verbose))?;

    match cli.command {
        Commands::Config(cmd) => config::execute(cmd, &cfg, format),
        Commands::Make(args) => make::execute(args, &PermissionService::new(cfg)?, format),
        Commands::Sync(args) => sync::execute(args, &PermissionService::new(cfg)?, format).await,
        Commands::Models => models::execute(&PermissionService::new(cfg)?, format),
    }
}

/// Apply `-v` flags on top of the configured level.
fn logging_for(mut logging: LoggingConfig, verbose: u8) -> LoggingConfig {
    match verbose {
        0 => {}
        1 => logging.level = "info".to_string(),
        2 => logging.level = "debug".to_string(),
        _ => logging.level = "trace".to_string(),
    }
    logging
}

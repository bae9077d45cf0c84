//! `config`: inspect and create the project configuration file.

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::{Path, PathBuf};

use enumperm_core::config::DEFAULT_CONFIG_FILE;
use enumperm_core::telemetry::redact_database_url;
use enumperm_core::Config;

use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration (file, environment and defaults)
    Show,

    /// Write a configuration file with the default settings
    Init {
        /// Target file
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

pub fn execute(cmd: ConfigCommands, config: &Config, format: OutputFormat) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show(config, format),
        ConfigCommands::Init { path, force } => init(&path, force, format),
    }
}

fn show(config: &Config, format: OutputFormat) -> Result<()> {
    let mut config = config.clone();
    config.database.url = config.database.url.as_deref().map(redact_database_url);
    match format {
        OutputFormat::Table => {
            output::print_header("Configuration");
            print!("{}", config.to_toml()?);
        }
        _ => output::print_item(&config, format),
    }
    Ok(())
}

pub fn init(path: &Path, force: bool, format: OutputFormat) -> Result<()> {
    if path.exists() && !force {
        output::print_info(&format!(
            "{} already exists. Use --force to overwrite it.",
            path.display()
        ));
        return Ok(());
    }

    let defaults = Config::default();
    let content = defaults.to_toml().context("Failed to serialize config")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    match format {
        OutputFormat::Table => {
            output::print_success(&format!("Configuration written to {}", path.display()))
        }
        _ => output::print_item(&defaults, format),
    }
    Ok(())
}

//! Configuration management.
//!
//! Configuration is read from an optional TOML file and `ENUMPERM__*`
//! environment variables, then passed explicitly into every component.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{EnumPermError, ErrorCode, Result};
use crate::rules::PermissionRule;
use crate::telemetry::LoggingConfig;

/// Environment variable prefix for overrides (`ENUMPERM__DATABASE__URL`, ...).
pub const ENV_PREFIX: &str = "ENUMPERM";

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "enumperm.toml";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root directory scanned for models
    #[serde(default = "default_models_path")]
    pub models_path: PathBuf,

    /// Namespace that corresponds to `models_path`, used when scaffolding
    #[serde(default = "default_models_namespace")]
    pub models_namespace: String,

    /// Fully-qualified user model (the authorization subject)
    #[serde(default = "default_user_model")]
    pub user_model: String,

    /// Base types a class must extend or implement to count as a model
    #[serde(default = "default_model_super_classes")]
    pub model_super_classes: Vec<String>,

    /// Authentication guards every permission is synced for
    #[serde(default = "default_guards")]
    pub guards: Vec<String>,

    /// Populate the `group` column while syncing
    #[serde(default, alias = "syncPermissionGroup", alias = "syncpermissiongroup")]
    pub sync_permission_group: bool,

    /// Permission rules, in generation order
    #[serde(default = "PermissionRule::defaults")]
    pub permissions: Vec<PermissionRule>,

    /// Source language conventions
    #[serde(default)]
    pub source: SourceConfig,

    /// Where generated files go
    #[serde(default)]
    pub output: OutputConfig,

    /// Permission sync settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            models_path: default_models_path(),
            models_namespace: default_models_namespace(),
            user_model: default_user_model(),
            model_super_classes: default_model_super_classes(),
            guards: default_guards(),
            sync_permission_group: false,
            permissions: PermissionRule::defaults(),
            source: SourceConfig::default(),
            output: OutputConfig::default(),
            sync: SyncConfig::default(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// File extension of application sources (without the dot)
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Namespace separator used in declarations and qualified names
    #[serde(default = "default_namespace_separator")]
    pub namespace_separator: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            namespace_separator: default_namespace_separator(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Place enums next to their models, swapping `models_segment` for
    /// `permissions_segment` in both namespace and path
    #[serde(default = "default_true")]
    pub enum_path_should_follow_models_path: bool,

    #[serde(default = "default_models_segment")]
    pub models_segment: String,

    #[serde(default = "default_permissions_segment")]
    pub permissions_segment: String,

    /// Enum directory when enums do not follow the models path
    #[serde(default = "default_permissions_path")]
    pub permissions_path: PathBuf,

    /// Enum namespace when enums do not follow the models path
    #[serde(default = "default_permissions_namespace")]
    pub permissions_namespace: String,

    #[serde(default = "default_policies_path")]
    pub policies_path: PathBuf,

    #[serde(default = "default_policies_namespace")]
    pub policies_namespace: String,

    /// Directory with `<template>.stub` overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stubs_path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            enum_path_should_follow_models_path: true,
            models_segment: default_models_segment(),
            permissions_segment: default_permissions_segment(),
            permissions_path: default_permissions_path(),
            permissions_namespace: default_permissions_namespace(),
            policies_path: default_policies_path(),
            policies_namespace: default_policies_namespace(),
            stubs_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Directory searched for permission enums when `--path` is not given
    #[serde(default = "default_app_path")]
    pub search_path: PathBuf,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            search_path: default_app_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL (`postgres://...` or `sqlite:...`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Permissions table name
    #[serde(default = "default_table")]
    pub table: String,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            table: default_table(),
            max_connections: default_max_connections(),
        }
    }
}

// Default value functions
fn default_models_path() -> PathBuf { PathBuf::from("app/Models") }
fn default_models_namespace() -> String { "App\\Models".to_string() }
fn default_user_model() -> String { "App\\Models\\User".to_string() }
/// `Model` first: scaffolded models extend the first entry. The rest are
/// framework subclasses that live outside the scanned tree.
fn default_model_super_classes() -> Vec<String> {
    [
        "Illuminate\\Database\\Eloquent\\Model",
        "Illuminate\\Foundation\\Auth\\User",
        "Illuminate\\Database\\Eloquent\\Relations\\Pivot",
        "Illuminate\\Database\\Eloquent\\Relations\\MorphPivot",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
fn default_guards() -> Vec<String> { vec!["web".to_string(), "api".to_string()] }
fn default_extension() -> String { "php".to_string() }
fn default_namespace_separator() -> String { "\\".to_string() }
fn default_true() -> bool { true }
fn default_models_segment() -> String { "Models".to_string() }
fn default_permissions_segment() -> String { "Permissions".to_string() }
fn default_permissions_path() -> PathBuf { PathBuf::from("app/Permissions") }
fn default_permissions_namespace() -> String { "App\\Permissions".to_string() }
fn default_policies_path() -> PathBuf { PathBuf::from("app/Policies") }
fn default_policies_namespace() -> String { "App\\Policies".to_string() }
fn default_app_path() -> PathBuf { PathBuf::from("app") }
fn default_table() -> String { "permissions".to_string() }
fn default_max_connections() -> u32 { 5 }

impl Config {
    /// Load configuration from an optional file plus the environment.
    ///
    /// With `path == None`, `enumperm.toml` in the working directory is used
    /// when it exists; otherwise only defaults and the environment apply.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        match path {
            Some(path) => {
                builder = builder.add_source(config::File::from(path));
            }
            None => {
                builder = builder.add_source(
                    config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
                );
            }
        }

        let env = config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("guards")
            .with_list_parse_key("model_super_classes");

        let cfg: Config = builder.add_source(env).build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a TOML document (no environment overrides).
    pub fn from_toml(content: &str) -> Result<Self> {
        let cfg: Config = config::Config::builder()
            .add_source(config::File::from_str(content, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Render this configuration as a TOML document.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.source.namespace_separator.is_empty() {
            return Err(EnumPermError::config("source.namespace_separator must not be empty"));
        }
        if self.source.extension.is_empty() || self.source.extension.starts_with('.') {
            return Err(EnumPermError::config(
                "source.extension must be a bare extension such as \"php\"",
            ));
        }
        if self.guards.iter().any(|g| g.trim().is_empty()) {
            return Err(EnumPermError::config("guards must not contain empty names"));
        }
        if !is_sql_identifier(&self.database.table) {
            return Err(EnumPermError::new(
                ErrorCode::InvalidConfiguration,
                format!("database.table '{}' is not a valid table name", self.database.table),
            ));
        }
        for rule in &self.permissions {
            if rule.method.is_empty() || rule.enum_case.is_empty() || rule.enum_value.is_empty() {
                return Err(EnumPermError::new(
                    ErrorCode::InvalidConfiguration,
                    format!("permission rule '{}' has an empty field", rule),
                ));
            }
        }
        Ok(())
    }

    /// Simple (unqualified) name of the user model.
    pub fn user_model_name(&self) -> &str {
        simple_name(&self.user_model, &self.source.namespace_separator)
    }
}

/// Last segment of a qualified name.
pub fn simple_name<'a>(qualified: &'a str, separator: &str) -> &'a str {
    qualified
        .rsplit(separator)
        .next()
        .unwrap_or(qualified)
}

fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

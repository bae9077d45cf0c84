#![allow(clippy::result_large_err)]
//! # enumperm core
//!
//! Generates permission enums and authorization policies for the models of a
//! namespace-based application, and syncs the generated permission names into
//! the application's permissions table.
//!
//! ## Architecture
//!
//! ```text
//! models dir ──► source (scanner + TypeIndex) ──► discovery ──► generator ──► files
//!                                                                  ▲
//!                                               rules + template ──┘
//!
//! permission files ──► source ──► sync ──► store (PostgreSQL / SQLite)
//! ```
//!
//! [`service::PermissionService`] wires these together for the `make` and
//! `sync` commands. Interaction goes through [`prompt::Prompt`], so every
//! workflow can run unattended.

pub mod config;
pub mod discovery;
pub mod error;
pub mod generator;
pub mod prompt;
pub mod rules;
pub mod service;
pub mod source;
pub mod store;
pub mod sync;
pub mod telemetry;
pub mod template;

pub use config::Config;
pub use error::{EnumPermError, ErrorCode, Result};
pub use service::PermissionService;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::discovery::{ModelDescriptor, ModelDiscoverer};
    pub use crate::error::{EnumPermError, ErrorCode, ErrorContext, Result};
    pub use crate::generator::{GeneratedFileWriter, OutputLayout, WriteOutcome};
    pub use crate::prompt::{AssumeNo, AssumeYes, Prompt};
    pub use crate::rules::{ArgumentSignature, ArgumentType, PermissionRule};
    pub use crate::service::{
        ArtifactOutcome, MakeReport, MakeRequest, PermissionService, SyncRequest,
    };
    pub use crate::store::{connect, PermissionStore};
    pub use crate::sync::{FileOutcome, SyncReport};
    pub use crate::template::TemplateSet;
}

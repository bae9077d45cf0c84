//! Subcommand implementations.

pub mod config;
pub mod make;
pub mod models;
pub mod sync;

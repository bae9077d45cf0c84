//! Error handling for enumperm.
//!
//! Every fallible operation in the crate returns [`Result`], whose error type
//! carries a stable [`ErrorCode`], a user-facing message, an optional internal
//! message for logs, and the source error.
//!
//! # Usage
//!
//! ```rust,ignore
//! use enumperm_core::error::{ErrorCode, ErrorContext, Result};
//!
//! fn read_stub(path: &Path) -> Result<String> {
//!     std::fs::read_to_string(path).with_error_code(ErrorCode::TemplateNotFound)
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, error, warn};

// ═══════════════════════════════════════════════════════════════════════════════
// Result Type Alias
// ═══════════════════════════════════════════════════════════════════════════════

/// A specialized Result type for enumperm operations.
pub type Result<T> = std::result::Result<T, EnumPermError>;

// ═══════════════════════════════════════════════════════════════════════════════
// Error Codes
// ═══════════════════════════════════════════════════════════════════════════════

/// Machine-readable error codes.
///
/// These codes are stable and are printed alongside CLI failures so scripts can
/// match on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Discovery Errors (1000-1099)
    ModelNotFound,
    NoModelsFound,
    ModelsPathMissing,

    // Generation Errors (1100-1199)
    TemplateNotFound,
    FileWriteFailed,
    FileReadFailed,

    // Sync Errors (1200-1299)
    NoPermissionFiles,
    NotAnEnum,
    ClassNotFound,
    CleanFailed,
    EnumNotStringBacked,

    // Database Errors (2000-2099)
    DatabaseError,
    DatabaseConnectionFailed,
    DatabaseQueryFailed,
    TableMissing,
    UnsupportedDatabase,

    // Serialization Errors (2200-2299)
    SerializationError,

    // Prompt Errors (3000-3099)
    PromptFailed,
    PromptCancelled,

    // Configuration Errors (5000-5099)
    ConfigurationError,
    MissingConfiguration,
    InvalidConfiguration,

    // Internal Errors (9000-9099)
    InternalError,
}

impl ErrorCode {
    /// Get the numeric code for this error.
    pub const fn numeric_code(&self) -> u32 {
        match self {
            Self::ModelNotFound => 1000,
            Self::NoModelsFound => 1001,
            Self::ModelsPathMissing => 1002,

            Self::TemplateNotFound => 1100,
            Self::FileWriteFailed => 1102,
            Self::FileReadFailed => 1103,

            Self::NoPermissionFiles => 1200,
            Self::NotAnEnum => 1201,
            Self::ClassNotFound => 1202,
            Self::CleanFailed => 1203,
            Self::EnumNotStringBacked => 1204,

            Self::DatabaseError => 2000,
            Self::DatabaseConnectionFailed => 2001,
            Self::DatabaseQueryFailed => 2002,
            Self::TableMissing => 2003,
            Self::UnsupportedDatabase => 2004,

            Self::SerializationError => 2200,

            Self::PromptFailed => 3000,
            Self::PromptCancelled => 3001,

            Self::ConfigurationError => 5000,
            Self::MissingConfiguration => 5001,
            Self::InvalidConfiguration => 5002,

            Self::InternalError => 9000,
        }
    }

    /// Get the error category for grouping.
    pub const fn category(&self) -> &'static str {
        match self.numeric_code() {
            1000..=1099 => "discovery",
            1100..=1199 => "generation",
            1200..=1299 => "sync",
            2000..=2099 => "database",
            2200..=2299 => "serialization",
            3000..=3099 => "prompt",
            5000..=5099 => "configuration",
            9000..=9099 => "internal",
            _ => "unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Error Severity
// ═══════════════════════════════════════════════════════════════════════════════

/// Severity level for errors (affects logging).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// User errors (bad input, missing model)
    Low,
    /// Operational issues (unreadable file, declined prompt)
    Medium,
    /// System errors (database failures, broken configuration)
    High,
}

impl ErrorSeverity {
    /// Get severity based on error code.
    pub const fn from_code(code: &ErrorCode) -> Self {
        match code {
            ErrorCode::ModelNotFound
            | ErrorCode::NoModelsFound
            | ErrorCode::NoPermissionFiles
            | ErrorCode::NotAnEnum
            | ErrorCode::ClassNotFound
            | ErrorCode::EnumNotStringBacked
            | ErrorCode::PromptCancelled => Self::Low,

            ErrorCode::ModelsPathMissing
            | ErrorCode::TemplateNotFound
            | ErrorCode::FileWriteFailed
            | ErrorCode::FileReadFailed
            | ErrorCode::PromptFailed => Self::Medium,

            ErrorCode::CleanFailed
            | ErrorCode::DatabaseError
            | ErrorCode::DatabaseConnectionFailed
            | ErrorCode::DatabaseQueryFailed
            | ErrorCode::TableMissing
            | ErrorCode::UnsupportedDatabase
            | ErrorCode::SerializationError
            | ErrorCode::ConfigurationError
            | ErrorCode::MissingConfiguration
            | ErrorCode::InvalidConfiguration
            | ErrorCode::InternalError => Self::High,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Main Error Type
// ═══════════════════════════════════════════════════════════════════════════════

/// The main error type for enumperm.
#[derive(Error, Debug)]
pub struct EnumPermError {
    /// Machine-readable error code
    code: ErrorCode,

    /// User-friendly error message
    user_message: Cow<'static, str>,

    /// Detailed internal message (for logging only)
    internal_message: Option<String>,

    /// The source error that caused this error
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl fmt::Display for EnumPermError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.user_message)?;
        if let Some(ref internal) = self.internal_message {
            write!(f, " ({})", internal)?;
        }
        Ok(())
    }
}

impl EnumPermError {
    // ─────────────────────────────────────────────────────────────────────────
    // Constructors
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a new error with code and user message.
    pub fn new(code: ErrorCode, user_message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code,
            user_message: user_message.into(),
            internal_message: None,
            source: None,
        }
    }

    /// Create an error with both user and internal messages.
    pub fn with_internal(
        code: ErrorCode,
        user_message: impl Into<Cow<'static, str>>,
        internal_message: impl Into<String>,
    ) -> Self {
        let mut error = Self::new(code, user_message);
        error.internal_message = Some(internal_message.into());
        error
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_internal(ErrorCode::InternalError, "An internal error occurred", message)
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorCode::InvalidConfiguration, message)
    }

    /// Wrap an I/O failure on `path`.
    pub fn io(code: ErrorCode, path: &Path, source: std::io::Error) -> Self {
        Self::with_internal(code, format!("I/O error on {}", path.display()), source.to_string())
            .with_source(source)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Builder Methods
    // ─────────────────────────────────────────────────────────────────────────

    /// Add a source error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Add internal message.
    pub fn with_internal_message(mut self, message: impl Into<String>) -> Self {
        self.internal_message = Some(message.into());
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Get the user-friendly message.
    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    /// Get the internal message (if any).
    pub fn internal_message(&self) -> Option<&str> {
        self.internal_message.as_deref()
    }

    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::from_code(&self.code)
    }

    /// Log this error with appropriate severity.
    pub fn log(&self) {
        let code = self.code.to_string();
        let category = self.code.category();

        match self.severity() {
            ErrorSeverity::High => {
                error!(
                    error_code = %code,
                    category = category,
                    user_message = %self.user_message,
                    internal_message = ?self.internal_message,
                    source = ?self.source,
                    "High severity error"
                );
            }
            ErrorSeverity::Medium => {
                warn!(
                    error_code = %code,
                    category = category,
                    user_message = %self.user_message,
                    internal_message = ?self.internal_message,
                    "Medium severity error"
                );
            }
            ErrorSeverity::Low => {
                debug!(
                    error_code = %code,
                    category = category,
                    user_message = %self.user_message,
                    "Low severity error"
                );
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Error Context Extension Trait
// ═══════════════════════════════════════════════════════════════════════════════

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with error code.
    fn with_error_code(self, code: ErrorCode) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| EnumPermError::internal(message.into()).with_source(e))
    }

    fn with_error_code(self, code: ErrorCode) -> Result<T> {
        self.map_err(|e| EnumPermError::new(code, e.to_string()).with_source(e))
    }
}

impl<T> ErrorContext<T> for Option<T> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| EnumPermError::internal(message.into()))
    }

    fn with_error_code(self, code: ErrorCode) -> Result<T> {
        self.ok_or_else(|| EnumPermError::new(code, "Value not present"))
    }
}

/// Extension trait attaching the offending path to I/O errors.
pub trait IoResultExt<T> {
    /// Map an I/O error to an [`EnumPermError`] that names `path`.
    fn at_path(self, code: ErrorCode, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::result::Result<T, std::io::Error> {
    fn at_path(self, code: ErrorCode, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|e| EnumPermError::io(code, path.as_ref(), e))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// From Implementations for Common Error Types
// ═══════════════════════════════════════════════════════════════════════════════

impl From<sqlx::Error> for EnumPermError {
    fn from(error: sqlx::Error) -> Self {
        let (code, user_msg) = match &error {
            sqlx::Error::Database(_) => (ErrorCode::DatabaseQueryFailed, "A database error occurred"),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => (
                ErrorCode::DatabaseConnectionFailed,
                "Unable to connect to the database",
            ),
            sqlx::Error::Configuration(_) => (
                ErrorCode::InvalidConfiguration,
                "Invalid database connection settings",
            ),
            _ => (ErrorCode::DatabaseError, "A database error occurred"),
        };

        Self::with_internal(code, user_msg, error.to_string()).with_source(error)
    }
}

impl From<config::ConfigError> for EnumPermError {
    fn from(error: config::ConfigError) -> Self {
        let code = match &error {
            config::ConfigError::NotFound(_) => ErrorCode::MissingConfiguration,
            _ => ErrorCode::ConfigurationError,
        };
        Self::with_internal(code, "Failed to load configuration", error.to_string())
            .with_source(error)
    }
}

impl From<toml::ser::Error> for EnumPermError {
    fn from(error: toml::ser::Error) -> Self {
        Self::with_internal(
            ErrorCode::SerializationError,
            "Failed to serialize configuration",
            error.to_string(),
        )
        .with_source(error)
    }
}

impl From<regex::Error> for EnumPermError {
    fn from(error: regex::Error) -> Self {
        Self::internal(error.to_string()).with_source(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::ModelNotFound.category(), "discovery");
        assert_eq!(ErrorCode::FileWriteFailed.category(), "generation");
        assert_eq!(ErrorCode::NotAnEnum.category(), "sync");
        assert_eq!(ErrorCode::TableMissing.category(), "database");
        assert_eq!(ErrorCode::InvalidConfiguration.category(), "configuration");
    }

    #[test]
    fn test_error_display() {
        let err = EnumPermError::with_internal(
            ErrorCode::CleanFailed,
            "Failed to clean permissions",
            "relation does not exist",
        );
        assert_eq!(
            err.to_string(),
            "[CleanFailed] Failed to clean permissions (relation does not exist)"
        );
    }

    #[test]
    fn test_error_context() {
        let result: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let err = result.with_error_code(ErrorCode::FileReadFailed).unwrap_err();
        assert_eq!(err.code(), ErrorCode::FileReadFailed);
        assert_eq!(err.user_message(), "gone");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_io_error_names_path() {
        let result: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"));
        let err = result
            .at_path(ErrorCode::FileWriteFailed, "/tmp/OrderPermission.php")
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::FileWriteFailed);
        assert!(err.user_message().contains("OrderPermission.php"));
    }

    #[test]
    fn test_error_severity() {
        assert_eq!(
            ErrorSeverity::from_code(&ErrorCode::NotAnEnum),
            ErrorSeverity::Low
        );
        assert_eq!(
            ErrorSeverity::from_code(&ErrorCode::CleanFailed),
            ErrorSeverity::High
        );
    }

    #[test]
    fn test_from_sqlx_error() {
        let err: EnumPermError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.code(), ErrorCode::DatabaseConnectionFailed);
    }
}

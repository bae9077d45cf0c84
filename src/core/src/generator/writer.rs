//! Writing generated files to disk.

use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{ErrorCode, IoResultExt, Result};
use crate::prompt::Prompt;

/// What happened to a target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteOutcome {
    /// The file did not exist and was created.
    Written,
    /// The file existed and was replaced.
    Overwritten,
    /// The file existed and was left untouched.
    Skipped,
}

impl WriteOutcome {
    pub fn is_written(&self) -> bool {
        !matches!(self, Self::Skipped)
    }
}

impl fmt::Display for WriteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Written => write!(f, "written"),
            Self::Overwritten => write!(f, "overwritten"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Writes generated documents, asking before replacing existing files.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneratedFileWriter {
    force: bool,
}

impl GeneratedFileWriter {
    /// With `force`, existing files are replaced without asking.
    pub fn new(force: bool) -> Self {
        Self { force }
    }

    /// Write `content` to `path`, creating parent directories.
    ///
    /// An existing file is replaced only when forced or when `prompt`
    /// confirms; otherwise it is left as is and [`WriteOutcome::Skipped`] is
    /// returned.
    pub fn write(&self, path: &Path, content: &str, prompt: &mut dyn Prompt) -> Result<WriteOutcome> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).at_path(ErrorCode::FileWriteFailed, parent)?;
        }

        let outcome = if path.exists() {
            let question = format!(
                "File {} already exists. Do you want to overwrite it?",
                path.display()
            );
            if !self.force && !prompt.confirm(&question, false)? {
                debug!(path = %path.display(), "Keeping existing file");
                return Ok(WriteOutcome::Skipped);
            }
            WriteOutcome::Overwritten
        } else {
            WriteOutcome::Written
        };

        std::fs::write(path, content).at_path(ErrorCode::FileWriteFailed, path)?;
        info!(path = %path.display(), outcome = %outcome, "Wrote generated file");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{Answer, AssumeNo, ScriptedPrompt};

    #[test]
    fn test_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app/Permissions/OrderPermission.php");

        let outcome = GeneratedFileWriter::new(false)
            .write(&path, "first", &mut AssumeNo)
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Written);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first");
    }

    #[test]
    fn test_declined_overwrite_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("OrderPolicy.php");
        std::fs::write(&path, "original").unwrap();

        let mut prompt = ScriptedPrompt::new([Answer::Confirm(false)]);
        let outcome = GeneratedFileWriter::new(false)
            .write(&path, "replacement", &mut prompt)
            .unwrap();

        assert_eq!(outcome, WriteOutcome::Skipped);
        assert!(!outcome.is_written());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "original");
        assert!(prompt.asked()[0].ends_with("already exists. Do you want to overwrite it?"));
    }

    #[test]
    fn test_confirmed_overwrite_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("OrderPolicy.php");
        std::fs::write(&path, "original").unwrap();

        let mut prompt = ScriptedPrompt::new([Answer::Confirm(true)]);
        let outcome = GeneratedFileWriter::new(false)
            .write(&path, "replacement", &mut prompt)
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Overwritten);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "replacement");
    }

    #[test]
    fn test_force_skips_the_question() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("OrderPolicy.php");
        std::fs::write(&path, "original").unwrap();

        let mut prompt = ScriptedPrompt::default();
        let outcome = GeneratedFileWriter::new(true)
            .write(&path, "replacement", &mut prompt)
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Overwritten);
        assert!(prompt.asked().is_empty());
    }
}

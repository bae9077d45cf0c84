//! Source introspection: the static stand-in for runtime reflection.
//!
//! Files are scanned into [`SourceFile`]s, then collected into a
//! [`TypeIndex`] that answers the questions the generators and the
//! synchronizer ask: does this type exist, is it abstract, is it an enum, what
//! are its cases, and does it extend a given base type.

pub mod index;
pub mod scanner;

pub use index::{TypeIndex, TypeInfo};
pub use scanner::{file_stem, qualify, EnumCaseDecl, SourceFile, SourceScanner, TypeDecl, TypeKind};

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recursively list files under `root` with the given extension, sorted by
/// file name within each directory so the order is stable for a given tree.
///
/// Unreadable directory entries are skipped.
pub fn list_source_files(root: &Path, extension: &str) -> Vec<PathBuf> {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(extension))
        .collect()
}

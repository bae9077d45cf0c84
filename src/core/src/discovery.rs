//! Model discovery.
//!
//! Walks the models directory, indexes every declared type, and keeps the
//! concrete classes that reach one of the configured base types.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{EnumPermError, ErrorCode, Result};
use crate::source::{list_source_files, SourceFile, SourceScanner, TypeIndex};

/// A discovered model type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelDescriptor {
    pub fully_qualified_name: String,
    pub simple_name: String,
    pub namespace: String,
    pub source_file_path: PathBuf,
}

/// Discovers models below a root directory.
#[derive(Debug, Clone)]
pub struct ModelDiscoverer {
    scanner: SourceScanner,
    extension: String,
}

impl ModelDiscoverer {
    pub fn new(scanner: SourceScanner, extension: impl Into<String>) -> Self {
        Self {
            scanner,
            extension: extension.into(),
        }
    }

    /// Discover models under `root` extending or implementing any of
    /// `base_type_names`.
    ///
    /// Each file is assumed to declare one type named after the file. Files
    /// that cannot be read, or that do not declare that type, are skipped.
    /// Results follow directory traversal order.
    pub fn discover(&self, root: &Path, base_type_names: &[String]) -> Result<Vec<ModelDescriptor>> {
        if !root.is_dir() {
            return Err(EnumPermError::new(
                ErrorCode::ModelsPathMissing,
                format!("Models path {} is not a directory", root.display()),
            ));
        }

        let separator = self.scanner.separator();
        let mut files: Vec<SourceFile> = Vec::new();
        for path in list_source_files(root, &self.extension) {
            match std::fs::read_to_string(&path) {
                Ok(text) => files.push(self.scanner.scan(&path, &text)),
                Err(e) => debug!(path = %path.display(), error = %e, "Skipping unreadable file"),
            }
        }

        let index = TypeIndex::build(separator, &files);
        let mut models = Vec::new();

        for file in &files {
            let candidate = file.expected_type_name(separator);
            let Some(info) = index.get(&candidate) else {
                debug!(class = %candidate, path = %file.path.display(), "No matching declaration");
                continue;
            };
            if !info.is_concrete_class() {
                debug!(class = %candidate, "Skipping non-instantiable type");
                continue;
            }
            if !base_type_names
                .iter()
                .any(|base| index.is_subtype_of(&candidate, base))
            {
                continue;
            }

            models.push(ModelDescriptor {
                fully_qualified_name: info.fully_qualified_name.clone(),
                simple_name: info.simple_name.clone(),
                namespace: info.namespace.clone(),
                source_file_path: file.path.clone(),
            });
        }

        info!(root = %root.display(), count = models.len(), "Discovered models");
        Ok(models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn discoverer() -> ModelDiscoverer {
        ModelDiscoverer::new(SourceScanner::new("\\").unwrap(), "php")
    }

    fn bases() -> Vec<String> {
        vec!["Illuminate\\Database\\Eloquent\\Model".to_string()]
    }

    #[test]
    fn test_discovers_concrete_models_only() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "Order.php",
            "<?php\nnamespace App\\Models;\n\nuse Illuminate\\Database\\Eloquent\\Model;\n\nclass Order extends Model\n{\n}\n",
        );
        write(
            root,
            "BaseModel.php",
            "<?php namespace App\\Models; abstract class BaseModel extends \\Illuminate\\Database\\Eloquent\\Model {}",
        );
        write(
            root,
            "Billing/Invoice.php",
            "<?php namespace App\\Models\\Billing; use App\\Models\\BaseModel; class Invoice extends BaseModel {}",
        );
        write(root, "Money.php", "<?php namespace App\\Models; final class Money {}");
        write(root, "Scopes.php", "<?php namespace App\\Models; trait Scopes {}");
        write(root, "Helpers.php", "<?php function helper() {}");

        let models = discoverer().discover(root, &bases()).unwrap();
        let names: Vec<&str> = models
            .iter()
            .map(|m| m.fully_qualified_name.as_str())
            .collect();
        assert_eq!(names, vec!["App\\Models\\Billing\\Invoice", "App\\Models\\Order"]);

        let order = &models[1];
        assert_eq!(order.simple_name, "Order");
        assert_eq!(order.namespace, "App\\Models");
        assert_eq!(order.source_file_path, root.join("Order.php"));
    }

    #[test]
    fn test_default_bases_cover_framework_subclasses() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "User.php",
            "<?php\nnamespace App\\Models;\n\nuse Illuminate\\Foundation\\Auth\\User as Authenticatable;\n\nclass User extends Authenticatable\n{\n}\n",
        );
        write(
            root,
            "OrderProduct.php",
            "<?php namespace App\\Models; use Illuminate\\Database\\Eloquent\\Relations\\Pivot; class OrderProduct extends Pivot {}",
        );
        write(
            root,
            "Order.php",
            "<?php namespace App\\Models; use Illuminate\\Database\\Eloquent\\Model; class Order extends Model {}",
        );

        let bases = crate::config::Config::default().model_super_classes;
        let mut names: Vec<String> = discoverer()
            .discover(root, &bases)
            .unwrap()
            .into_iter()
            .map(|m| m.simple_name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["Order", "OrderProduct", "User"]);
    }

    #[test]
    fn test_file_without_namespace_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "Loose.php",
            "<?php class Other extends \\Illuminate\\Database\\Eloquent\\Model {}",
        );
        let models = discoverer().discover(dir.path(), &bases()).unwrap();
        assert!(models.is_empty());
    }

    #[test]
    fn test_interface_base_type() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "Ticket.php",
            "<?php namespace Desk; class Ticket implements \\Desk\\Contracts\\Authorizable {}",
        );
        let models = discoverer()
            .discover(dir.path(), &["\\Desk\\Contracts\\Authorizable".to_string()])
            .unwrap();
        assert_eq!(models.len(), 1);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let err = discoverer()
            .discover(Path::new("/definitely/not/here"), &bases())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ModelsPathMissing);
    }
}

//! Source generation for permission enums and policies.
//!
//! Generators are pure: they take a model, the permission rules and the
//! templates, and return the rendered document plus where it belongs. Writing
//! to disk is left to [`GeneratedFileWriter`].

pub mod enum_gen;
pub mod policy;
pub mod writer;

pub use enum_gen::{generate_enum, EnumCase, GeneratedEnum};
pub use policy::{generate_policy, GeneratedPolicy, PolicyMethod};
pub use writer::{GeneratedFileWriter, WriteOutcome};

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::discovery::ModelDescriptor;
use crate::source::qualify;

/// Suffix appended to a model name to form its permission enum name.
pub const ENUM_SUFFIX: &str = "Permission";

/// Suffix appended to a model name to form its policy name.
pub const POLICY_SUFFIX: &str = "Policy";

/// Where generated files and namespaces go.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    pub separator: String,
    pub extension: String,
    pub enum_follows_models_path: bool,
    pub models_segment: String,
    pub permissions_segment: String,
    pub permissions_path: PathBuf,
    pub permissions_namespace: String,
    pub policies_path: PathBuf,
    pub policies_namespace: String,
}

impl OutputLayout {
    pub fn from_config(config: &Config) -> Self {
        let output = &config.output;
        Self {
            separator: config.source.namespace_separator.clone(),
            extension: config.source.extension.clone(),
            enum_follows_models_path: output.enum_path_should_follow_models_path,
            models_segment: output.models_segment.clone(),
            permissions_segment: output.permissions_segment.clone(),
            permissions_path: output.permissions_path.clone(),
            permissions_namespace: output.permissions_namespace.clone(),
            policies_path: output.policies_path.clone(),
            policies_namespace: output.policies_namespace.clone(),
        }
    }

    /// Namespace and file path of the permission enum for `model`.
    ///
    /// When enums follow the models path, every occurrence of the models
    /// segment in the model's namespace and directory becomes the
    /// permissions segment, so `App\Models\Billing\Invoice` in
    /// `app/Models/Billing/Invoice.php` maps to `App\Permissions\Billing` in
    /// `app/Permissions/Billing/InvoicePermission.php`.
    pub fn enum_target(&self, model: &ModelDescriptor) -> (String, PathBuf) {
        let file_name = self.file_name(&model.simple_name, ENUM_SUFFIX);

        if !self.enum_follows_models_path {
            return (
                self.permissions_namespace.clone(),
                self.permissions_path.join(file_name),
            );
        }

        let namespace = model
            .namespace
            .replace(&self.models_segment, &self.permissions_segment);
        let dir = model
            .source_file_path
            .parent()
            .map(|dir| self.swap_segment(dir))
            .unwrap_or_default();
        (namespace, dir.join(file_name))
    }

    /// Namespace and file path of the policy for `model`.
    pub fn policy_target(&self, model: &ModelDescriptor) -> (String, PathBuf) {
        (
            self.policies_namespace.clone(),
            self.policies_path
                .join(self.file_name(&model.simple_name, POLICY_SUFFIX)),
        )
    }

    /// Qualify `name` inside `namespace` with this layout's separator.
    pub fn qualify(&self, namespace: &str, name: &str) -> String {
        qualify(namespace, name, &self.separator)
    }

    fn file_name(&self, model_name: &str, suffix: &str) -> String {
        format!("{}{}.{}", model_name, suffix, self.extension)
    }

    fn swap_segment(&self, dir: &Path) -> PathBuf {
        PathBuf::from(
            dir.to_string_lossy()
                .replace(&self.models_segment, &self.permissions_segment),
        )
    }
}

/// `Order` → `order`, `LineItem` → `lineItem`.
pub fn lower_camel(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

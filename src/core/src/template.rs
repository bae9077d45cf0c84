//! Text templates and ordered placeholder substitution.
//!
//! Templates are plain text with `{{token}}` placeholders. Rendering applies
//! each substitution pair in order with replace-all semantics, so a later pair
//! sees the output of earlier ones. There is no escaping and no control flow.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

use crate::error::{ErrorCode, IoResultExt, Result};

/// Version of the placeholder token contract below. Bump when a token is
/// renamed or removed so stub overrides can be checked against it.
pub const TEMPLATE_CONTRACT_VERSION: u32 = 1;

/// Apply `substitutions` to `template` in order, replacing every occurrence.
pub fn render(template: &str, substitutions: &[(&str, &str)]) -> String {
    substitutions
        .iter()
        .fold(template.to_string(), |text, (token, value)| text.replace(token, value))
}

/// Placeholder tokens still present in `text`, in order of appearance.
pub fn unresolved_placeholders(text: &str) -> Vec<String> {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let re = PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{[A-Za-z_][A-Za-z0-9_]*\}\}").expect("static regex")
    });
    re.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Template Kinds
// ═══════════════════════════════════════════════════════════════════════════════

/// The named templates used by the generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Enum,
    EnumCase,
    Policy,
    PolicyMethod,
    Parameter,
    Model,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 6] = [
        Self::Enum,
        Self::EnumCase,
        Self::Policy,
        Self::PolicyMethod,
        Self::Parameter,
        Self::Model,
    ];

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Enum => "enum",
            Self::EnumCase => "enum_case",
            Self::Policy => "policy",
            Self::PolicyMethod => "policy_method",
            Self::Parameter => "parameter",
            Self::Model => "model",
        }
    }

    /// File name of an override in the stubs directory.
    pub fn file_name(&self) -> String {
        format!("{}.stub", self.name())
    }

    /// Tokens this template may contain.
    pub const fn placeholders(&self) -> &'static [&'static str] {
        match self {
            Self::Enum => &["{{namespace}}", "{{enumName}}", "{{cases}}"],
            Self::EnumCase => &["{{enumCase}}", "{{enumValue}}", "{{modelName}}"],
            Self::Policy => &[
                "{{namespace}}",
                "{{policyNamespace}}",
                "{{modelName}}",
                "{{permissionEnum}}",
                "{{policyName}}",
                "{{model}}",
                "{{modelVariable}}",
                "{{methods}}",
                "{{userModel}}",
                "{{userModelName}}",
                "{{permissionEnumName}}",
            ],
            Self::PolicyMethod => &[
                "{{method}}",
                "{{arguments}}",
                "{{enumValue}}",
                "{{enumCase}}",
                "{{permissionEnumName}}",
                "{{modelName}}",
                "{{userModelName}}",
            ],
            Self::Parameter => &["{{type}}", "{{name}}"],
            Self::Model => &[
                "{{namespace}}",
                "{{modelName}}",
                "{{baseModel}}",
                "{{baseModelName}}",
            ],
        }
    }

    fn embedded(&self) -> &'static str {
        match self {
            Self::Enum => include_str!("../stubs/enum.stub"),
            Self::EnumCase => include_str!("../stubs/enum_case.stub"),
            Self::Policy => include_str!("../stubs/policy.stub"),
            Self::PolicyMethod => include_str!("../stubs/policy_method.stub"),
            Self::Parameter => include_str!("../stubs/parameter.stub"),
            Self::Model => include_str!("../stubs/model.stub"),
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Template Set
// ═══════════════════════════════════════════════════════════════════════════════

/// The six templates, either embedded defaults or overrides from disk.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    enum_file: String,
    enum_case: String,
    policy: String,
    policy_method: String,
    parameter: String,
    model: String,
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self::embedded()
    }
}

impl TemplateSet {
    /// The templates compiled into the binary.
    pub fn embedded() -> Self {
        let mut set = Self {
            enum_file: String::new(),
            enum_case: String::new(),
            policy: String::new(),
            policy_method: String::new(),
            parameter: String::new(),
            model: String::new(),
        };
        for kind in TemplateKind::ALL {
            set.set(kind, kind.embedded().to_string());
        }
        set
    }

    /// Embedded defaults, overridden by any `<name>.stub` found in
    /// `stubs_path`.
    pub fn load(stubs_path: Option<&Path>) -> Result<Self> {
        let mut set = Self::embedded();
        let Some(dir) = stubs_path else {
            return Ok(set);
        };

        for kind in TemplateKind::ALL {
            let path = dir.join(kind.file_name());
            if !path.is_file() {
                continue;
            }
            let text = std::fs::read_to_string(&path).at_path(ErrorCode::TemplateNotFound, &path)?;
            debug!(template = %kind, path = %path.display(), "Using template override");
            set.set(kind, text);
        }
        Ok(set)
    }

    pub fn get(&self, kind: TemplateKind) -> &str {
        match kind {
            TemplateKind::Enum => &self.enum_file,
            TemplateKind::EnumCase => &self.enum_case,
            TemplateKind::Policy => &self.policy,
            TemplateKind::PolicyMethod => &self.policy_method,
            TemplateKind::Parameter => &self.parameter,
            TemplateKind::Model => &self.model,
        }
    }

    /// Replace one template. A trailing line break on the parameter template
    /// is dropped since parameters are joined inline.
    pub fn set(&mut self, kind: TemplateKind, text: String) {
        match kind {
            TemplateKind::Enum => self.enum_file = text,
            TemplateKind::EnumCase => self.enum_case = text,
            TemplateKind::Policy => self.policy = text,
            TemplateKind::PolicyMethod => self.policy_method = text,
            TemplateKind::Parameter => {
                self.parameter = text.trim_end_matches(['\r', '\n']).to_string()
            }
            TemplateKind::Model => self.model = text,
        }
    }
}

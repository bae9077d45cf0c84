//! Permission enum generation.

use serde::Serialize;
use std::path::PathBuf;

use super::{OutputLayout, ENUM_SUFFIX};
use crate::discovery::ModelDescriptor;
use crate::rules::{PermissionRule, MODEL_NAME_PLACEHOLDER};
use crate::template::{render, TemplateKind, TemplateSet};

/// One case of a generated enum, with its value fully resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumCase {
    pub name: String,
    pub value: String,
}

/// A rendered permission enum.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedEnum {
    pub class_name: String,
    pub namespace: String,
    pub file_path: PathBuf,
    pub cases: Vec<EnumCase>,
    #[serde(skip)]
    pub content: String,
}

impl GeneratedEnum {
    /// Fully-qualified name of the enum.
    pub fn fully_qualified_name(&self, layout: &OutputLayout) -> String {
        layout.qualify(&self.namespace, &self.class_name)
    }
}

/// Render the permission enum for `model`.
///
/// Case lines are rendered from the raw value templates and the model name is
/// substituted over the accumulated block after each rule, so a value
/// template may use `{{modelName}}` anywhere. The outer template then receives
/// `{{cases}}`, `{{enumName}}` and `{{namespace}}`, in that order.
pub fn generate_enum(
    model: &ModelDescriptor,
    rules: &[PermissionRule],
    layout: &OutputLayout,
    templates: &TemplateSet,
) -> GeneratedEnum {
    let model_name = model.simple_name.as_str();
    let case_template = templates.get(TemplateKind::EnumCase);

    let mut block = String::new();
    for rule in rules {
        block.push_str(&render(
            case_template,
            &[
                ("{{enumCase}}", rule.enum_case.as_str()),
                ("{{enumValue}}", rule.enum_value.as_str()),
            ],
        ));
        block = block.replace(MODEL_NAME_PLACEHOLDER, model_name);
    }

    let class_name = format!("{}{}", model_name, ENUM_SUFFIX);
    let (namespace, file_path) = layout.enum_target(model);

    let content = render(
        templates.get(TemplateKind::Enum),
        &[
            ("{{cases}}", block.as_str()),
            ("{{enumName}}", class_name.as_str()),
            ("{{namespace}}", namespace.as_str()),
        ],
    );

    let cases = rules
        .iter()
        .map(|rule| EnumCase {
            name: rule.enum_case.clone(),
            value: rule.value_for(model_name),
        })
        .collect();

    GeneratedEnum {
        class_name,
        namespace,
        file_path,
        cases,
        content,
    }
}

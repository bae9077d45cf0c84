//! Authorization policy generation.

use serde::Serialize;
use std::path::PathBuf;

use super::{lower_camel, OutputLayout, ENUM_SUFFIX, POLICY_SUFFIX};
use crate::config::simple_name;
use crate::discovery::ModelDescriptor;
use crate::rules::{ArgumentSignature, PermissionRule};
use crate::template::{render, TemplateKind, TemplateSet};

/// One generated policy method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyMethod {
    pub name: String,
    pub arguments: Vec<ArgumentSignature>,
    pub enum_case: String,
}

/// A rendered policy.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedPolicy {
    pub class_name: String,
    pub namespace: String,
    pub file_path: PathBuf,
    pub methods: Vec<PolicyMethod>,
    #[serde(skip)]
    pub content: String,
}

/// Render the policy for `model`, whose permission enum lives in
/// `permission_namespace`.
///
/// Rendering runs in three passes over the policy template: model and enum
/// identity first, then `{{methods}}` built from one `policy_method` rendering
/// per rule, then user model and enum names over the whole document so the
/// method bodies pick them up too.
pub fn generate_policy(
    model: &ModelDescriptor,
    permission_namespace: &str,
    rules: &[PermissionRule],
    user_model: &str,
    layout: &OutputLayout,
    templates: &TemplateSet,
) -> GeneratedPolicy {
    let model_name = model.simple_name.as_str();
    let model_variable = lower_camel(model_name);
    let policy_name = format!("{}{}", model_name, POLICY_SUFFIX);
    let permission_enum_name = format!("{}{}", model_name, ENUM_SUFFIX);
    let permission_enum = layout.qualify(permission_namespace, &permission_enum_name);
    let user_model_name = simple_name(user_model, &layout.separator);
    let (policy_namespace, file_path) = layout.policy_target(model);

    let policy = render(
        templates.get(TemplateKind::Policy),
        &[
            ("{{namespace}}", model.namespace.as_str()),
            ("{{policyNamespace}}", policy_namespace.as_str()),
            ("{{modelName}}", model_name),
            ("{{permissionEnum}}", permission_enum.as_str()),
            ("{{policyName}}", policy_name.as_str()),
            ("{{model}}", model.fully_qualified_name.as_str()),
            ("{{modelVariable}}", model_variable.as_str()),
        ],
    );

    let method_template = templates.get(TemplateKind::PolicyMethod);
    let parameter_template = templates.get(TemplateKind::Parameter);
    let methods: Vec<String> = rules
        .iter()
        .map(|rule| {
            let arguments = render_arguments(parameter_template, &rule.arguments);
            render(
                method_template,
                &[
                    ("{{method}}", rule.method.as_str()),
                    ("{{arguments}}", arguments.as_str()),
                    ("{{enumValue}}", rule.enum_value.as_str()),
                    ("{{enumCase}}", rule.enum_case.as_str()),
                ],
            )
        })
        .collect();
    let methods = methods.join("\n");

    let content = render(
        &policy,
        &[
            ("{{methods}}", methods.as_str()),
            ("{{userModel}}", user_model),
            ("{{userModelName}}", user_model_name),
            ("{{modelName}}", model_name),
            ("{{permissionEnumName}}", permission_enum_name.as_str()),
        ],
    );

    GeneratedPolicy {
        class_name: policy_name,
        namespace: policy_namespace,
        file_path,
        methods: rules
            .iter()
            .map(|rule| PolicyMethod {
                name: rule.method.clone(),
                arguments: rule.arguments.clone(),
                enum_case: rule.enum_case.clone(),
            })
            .collect(),
        content,
    }
}

fn render_arguments(template: &str, arguments: &[ArgumentSignature]) -> String {
    arguments
        .iter()
        .map(|arg| {
            render(
                template,
                &[("{{type}}", arg.ty.as_template()), ("{{name}}", arg.name.as_str())],
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

//! Permission rules: one rule per generated enum case and policy method.
//!
//! Rules are configuration data. The seven defaults mirror the usual policy
//! abilities (`viewAny`, `view`, `create`, `update`, `delete`, `restore`,
//! `forceDelete`) and produce values of the form `<ModelName>.<action>`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder substituted with the model's simple name.
pub const MODEL_NAME_PLACEHOLDER: &str = "{{modelName}}";

/// Placeholder substituted with the user model's simple name.
pub const USER_MODEL_NAME_PLACEHOLDER: &str = "{{userModelName}}";

/// Type of a policy method parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ArgumentType {
    /// The configured user model (the subject being authorized).
    User,
    /// The model the policy is generated for.
    Model,
    /// Any other literal type name.
    Named(String),
}

impl ArgumentType {
    /// The text emitted for this type in generated sources.
    ///
    /// `User` and `Model` render as placeholders that the policy generator
    /// resolves in its final substitution pass.
    pub fn as_template(&self) -> &str {
        match self {
            Self::User => USER_MODEL_NAME_PLACEHOLDER,
            Self::Model => MODEL_NAME_PLACEHOLDER,
            Self::Named(name) => name,
        }
    }
}

impl From<String> for ArgumentType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "user" => Self::User,
            "model" => Self::Model,
            _ => Self::Named(value),
        }
    }
}

impl From<ArgumentType> for String {
    fn from(value: ArgumentType) -> Self {
        match value {
            ArgumentType::User => "user".to_string(),
            ArgumentType::Model => "model".to_string(),
            ArgumentType::Named(name) => name,
        }
    }
}

/// One `(type, name)` parameter of a generated policy method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentSignature {
    #[serde(rename = "type")]
    pub ty: ArgumentType,
    pub name: String,
}

impl ArgumentSignature {
    pub fn new(ty: ArgumentType, name: impl Into<String>) -> Self {
        Self {
            ty,
            name: name.into(),
        }
    }

    pub fn user() -> Self {
        Self::new(ArgumentType::User, "user")
    }

    pub fn model() -> Self {
        Self::new(ArgumentType::Model, "model")
    }
}

/// A permission rule: policy method, its parameters, and the enum case it checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRule {
    /// Policy method name (e.g. `viewAny`).
    pub method: String,

    /// Ordered method parameters.
    #[serde(default)]
    pub arguments: Vec<ArgumentSignature>,

    /// Enum case identifier (e.g. `VIEW_ANY`).
    pub enum_case: String,

    /// Enum value template (e.g. `{{modelName}}.viewAny`).
    pub enum_value: String,
}

impl PermissionRule {
    pub fn new(
        method: impl Into<String>,
        arguments: Vec<ArgumentSignature>,
        enum_case: impl Into<String>,
        enum_value: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            arguments,
            enum_case: enum_case.into(),
            enum_value: enum_value.into(),
        }
    }

    /// The enum value with the model placeholder resolved.
    pub fn value_for(&self, model_name: &str) -> String {
        self.enum_value.replace(MODEL_NAME_PLACEHOLDER, model_name)
    }

    /// The seven default rules, in policy order.
    pub fn defaults() -> Vec<PermissionRule> {
        let user_only = || vec![ArgumentSignature::user()];
        let user_and_model = || vec![ArgumentSignature::user(), ArgumentSignature::model()];

        vec![
            Self::new("viewAny", user_only(), "VIEW_ANY", "{{modelName}}.viewAny"),
            Self::new("view", user_and_model(), "VIEW", "{{modelName}}.view"),
            Self::new("create", user_only(), "CREATE", "{{modelName}}.create"),
            Self::new("update", user_and_model(), "UPDATE", "{{modelName}}.update"),
            Self::new("delete", user_and_model(), "DELETE", "{{modelName}}.delete"),
            Self::new("restore", user_and_model(), "RESTORE", "{{modelName}}.restore"),
            Self::new(
                "forceDelete",
                user_and_model(),
                "FORCE_DELETE",
                "{{modelName}}.forceDelete",
            ),
        ]
    }
}

impl fmt::Display for PermissionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} = {})", self.method, self.enum_case, self.enum_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_policy_abilities() {
        let rules = PermissionRule::defaults();
        let methods: Vec<&str> = rules.iter().map(|r| r.method.as_str()).collect();
        assert_eq!(
            methods,
            vec!["viewAny", "view", "create", "update", "delete", "restore", "forceDelete"]
        );
        assert!(rules.iter().all(|r| r.arguments[0] == ArgumentSignature::user()));
        assert_eq!(rules[0].arguments.len(), 1);
        assert_eq!(rules[1].arguments.len(), 2);
    }

    #[test]
    fn test_value_for_substitutes_model_name() {
        let rules = PermissionRule::defaults();
        assert_eq!(rules[6].value_for("Order"), "Order.forceDelete");
    }

    #[test]
    fn test_argument_type_serde() {
        let sig: ArgumentSignature =
            serde_json::from_str(r#"{"type":"model","name":"model"}"#).unwrap();
        assert_eq!(sig, ArgumentSignature::model());

        let named: ArgumentSignature =
            serde_json::from_str(r#"{"type":"Request","name":"request"}"#).unwrap();
        assert_eq!(named.ty, ArgumentType::Named("Request".to_string()));

        let json = serde_json::to_string(&ArgumentSignature::user()).unwrap();
        assert_eq!(json, r#"{"type":"user","name":"user"}"#);
    }
}

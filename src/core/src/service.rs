//! The `make` and `sync` workflows.
//!
//! [`PermissionService`] owns the configuration and the loaded templates and
//! composes discovery, generation, writing and synchronization. It returns
//! structured reports; presenting them is up to the caller.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::{simple_name, Config};
use crate::discovery::{ModelDescriptor, ModelDiscoverer};
use crate::error::{EnumPermError, ErrorCode, Result};
use crate::generator::{
    generate_enum, generate_policy, GeneratedFileWriter, OutputLayout, WriteOutcome,
};
use crate::prompt::Prompt;
use crate::source::{qualify, SourceScanner};
use crate::store::PermissionStore;
use crate::sync::{PermissionSynchronizer, SyncOptions, SyncReport};
use crate::template::{render, TemplateKind, TemplateSet};

/// Label of the option that selects every model.
pub const ALL_MODELS: &str = "all";

/// Question asked when a named model does not exist.
pub const CREATE_MODEL_QUESTION: &str =
    "Model not found. Do you want to create a new model & Generate Permission Enum?";

// ═══════════════════════════════════════════════════════════════════════════════
// Requests and Reports
// ═══════════════════════════════════════════════════════════════════════════════

/// Input of the `make` workflow.
#[derive(Debug, Clone, Default)]
pub struct MakeRequest {
    /// Model identifier; `/` is accepted as namespace separator.
    pub model: Option<String>,
    /// Also generate a policy.
    pub policy: bool,
    /// Overwrite existing files without asking.
    pub force: bool,
}

/// Input of the `sync` workflow.
#[derive(Debug, Clone, Default)]
pub struct SyncRequest {
    pub clean: bool,
    /// Search root; defaults to `sync.search_path`.
    pub path: Option<PathBuf>,
    pub force: bool,
}

/// What happened to one generated artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ArtifactOutcome {
    Generated,
    Overwritten,
    Skipped,
    Failed { message: String },
}

impl ArtifactOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn is_written(&self) -> bool {
        matches!(self, Self::Generated | Self::Overwritten)
    }
}

impl From<WriteOutcome> for ArtifactOutcome {
    fn from(outcome: WriteOutcome) -> Self {
        match outcome {
            WriteOutcome::Written => Self::Generated,
            WriteOutcome::Overwritten => Self::Overwritten,
            WriteOutcome::Skipped => Self::Skipped,
        }
    }
}

impl fmt::Display for ArtifactOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generated => write!(f, "generated"),
            Self::Overwritten => write!(f, "overwritten"),
            Self::Skipped => write!(f, "skipped"),
            Self::Failed { message } => write!(f, "failed: {}", message),
        }
    }
}

/// A generated file and what happened to it.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactResult {
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: ArtifactOutcome,
}

/// Generation results for one model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelReport {
    pub model: ModelDescriptor,
    pub permission_enum: ArtifactResult,
    /// Present when a policy was requested and the enum was written.
    pub policy: Option<ArtifactResult>,
}

/// Outcome of a `make` run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MakeReport {
    /// Model file created because the named model did not exist.
    pub scaffolded: Option<ArtifactResult>,
    pub models: Vec<ModelReport>,
}

impl MakeReport {
    /// A run fails when models were attempted and every one of them failed.
    /// Skipped files are not failures.
    pub fn is_success(&self) -> bool {
        self.models.is_empty() || self.models.iter().any(|m| !m.permission_enum.outcome.is_failed())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Service
// ═══════════════════════════════════════════════════════════════════════════════

/// Entry point for the command workflows.
#[derive(Debug, Clone)]
pub struct PermissionService {
    config: Config,
    templates: TemplateSet,
    layout: OutputLayout,
    scanner: SourceScanner,
}

impl PermissionService {
    /// Validate `config` and load templates.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let templates = TemplateSet::load(config.output.stubs_path.as_deref())?;
        Self::with_templates(config, templates)
    }

    /// Use the given templates instead of loading them.
    pub fn with_templates(config: Config, templates: TemplateSet) -> Result<Self> {
        let scanner = SourceScanner::new(&config.source.namespace_separator)?;
        let layout = OutputLayout::from_config(&config);
        Ok(Self {
            config,
            templates,
            layout,
            scanner,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    fn separator(&self) -> &str {
        &self.config.source.namespace_separator
    }

    /// All models under `models_path`.
    pub fn models(&self) -> Result<Vec<ModelDescriptor>> {
        ModelDiscoverer::new(self.scanner.clone(), self.config.source.extension.clone())
            .discover(&self.config.models_path, &self.config.model_super_classes)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // make
    // ─────────────────────────────────────────────────────────────────────────

    /// Generate permission enums (and optionally policies).
    ///
    /// With a model identifier, that model is generated; an unknown model may
    /// be scaffolded after confirmation, and declining is a `ModelNotFound`
    /// error. Without one, the user picks from every discovered model.
    pub fn make(&self, request: &MakeRequest, prompt: &mut dyn Prompt) -> Result<MakeReport> {
        let writer = GeneratedFileWriter::new(request.force);
        let mut report = MakeReport::default();

        let selected = match &request.model {
            Some(identifier) => {
                let models = match self.models() {
                    Ok(models) => models,
                    Err(e) if e.code() == ErrorCode::ModelsPathMissing => Vec::new(),
                    Err(e) => return Err(e),
                };
                let identifier = identifier.replace('/', self.separator());

                match self.find_model(&models, &identifier) {
                    Some(model) => vec![model.clone()],
                    None => {
                        warn!(model = %identifier, "Model not found");
                        if !prompt.confirm(CREATE_MODEL_QUESTION, false)? {
                            return Err(EnumPermError::new(
                                ErrorCode::ModelNotFound,
                                format!("Permission enum generation skipped for {}", identifier),
                            ));
                        }
                        let (model, outcome) = self.scaffold_model(&identifier, &writer, prompt)?;
                        report.scaffolded = Some(ArtifactResult {
                            path: model.source_file_path.clone(),
                            outcome,
                        });
                        vec![model]
                    }
                }
            }
            None => {
                let models = self.models()?;
                if models.is_empty() {
                    return Err(EnumPermError::new(
                        ErrorCode::NoModelsFound,
                        format!("No models found in {}", self.config.models_path.display()),
                    ));
                }
                self.choose_models(models, prompt)?
            }
        };

        for model in &selected {
            report
                .models
                .push(self.generate_for(model, request.policy, &writer, prompt));
        }
        Ok(report)
    }

    /// Generate and write the enum, then the policy when requested and the
    /// enum was written.
    pub fn generate_for(
        &self,
        model: &ModelDescriptor,
        policy: bool,
        writer: &GeneratedFileWriter,
        prompt: &mut dyn Prompt,
    ) -> ModelReport {
        let generated = generate_enum(
            model,
            &self.config.permissions,
            &self.layout,
            &self.templates,
        );
        let enum_outcome = match writer.write(&generated.file_path, &generated.content, prompt) {
            Ok(outcome) => ArtifactOutcome::from(outcome),
            Err(e) => ArtifactOutcome::Failed {
                message: e.user_message().to_string(),
            },
        };
        info!(model = %model.fully_qualified_name, outcome = %enum_outcome, "Permission enum");

        let policy = (policy && enum_outcome.is_written()).then(|| {
            let generated_policy = generate_policy(
                model,
                &generated.namespace,
                &self.config.permissions,
                &self.config.user_model,
                &self.layout,
                &self.templates,
            );
            let outcome =
                match writer.write(&generated_policy.file_path, &generated_policy.content, prompt) {
                    Ok(outcome) => ArtifactOutcome::from(outcome),
                    Err(e) => ArtifactOutcome::Failed {
                        message: e.user_message().to_string(),
                    },
                };
            info!(model = %model.fully_qualified_name, outcome = %outcome, "Policy");
            ArtifactResult {
                path: generated_policy.file_path,
                outcome,
            }
        });

        ModelReport {
            model: model.clone(),
            permission_enum: ArtifactResult {
                path: generated.file_path,
                outcome: enum_outcome,
            },
            policy,
        }
    }

    /// Create a model source file from the `model` template.
    ///
    /// A relative identifier is placed under `models_namespace`; an
    /// identifier already inside that namespace keeps its sub-namespace. The
    /// file goes to the matching directory below `models_path`.
    pub fn scaffold_model(
        &self,
        identifier: &str,
        writer: &GeneratedFileWriter,
        prompt: &mut dyn Prompt,
    ) -> Result<(ModelDescriptor, ArtifactOutcome)> {
        let sep = self.separator();
        let identifier = identifier.trim_start_matches(sep);
        let relative = identifier
            .strip_prefix(&format!("{}{}", self.config.models_namespace, sep))
            .unwrap_or(identifier);
        let segments: Vec<&str> = relative.split(sep).filter(|s| !s.is_empty()).collect();
        let Some((&name, parents)) = segments.split_last() else {
            return Err(EnumPermError::new(
                ErrorCode::ModelNotFound,
                format!("'{}' is not a valid model name", identifier),
            ));
        };

        let namespace = parents
            .iter()
            .fold(self.config.models_namespace.clone(), |ns, part| qualify(&ns, part, sep));
        let mut path = self.config.models_path.clone();
        for part in parents {
            path.push(part);
        }
        path.push(format!("{}.{}", name, self.config.source.extension));

        let base_model = self
            .config
            .model_super_classes
            .first()
            .map(|base| base.trim_start_matches(sep).to_string())
            .ok_or_else(|| EnumPermError::config("model_super_classes must not be empty"))?;

        let content = render(
            self.templates.get(TemplateKind::Model),
            &[
                ("{{namespace}}", namespace.as_str()),
                ("{{modelName}}", name),
                ("{{baseModel}}", base_model.as_str()),
                ("{{baseModelName}}", simple_name(&base_model, sep)),
            ],
        );

        let outcome = writer.write(&path, &content, prompt)?;
        info!(model = %qualify(&namespace, name, sep), path = %path.display(), "Model created");

        Ok((
            ModelDescriptor {
                fully_qualified_name: qualify(&namespace, name, sep),
                simple_name: name.to_string(),
                namespace,
                source_file_path: path,
            },
            outcome.into(),
        ))
    }

    /// Match an identifier against discovered models, either as written or
    /// relative to `models_namespace`.
    fn find_model<'a>(
        &self,
        models: &'a [ModelDescriptor],
        identifier: &str,
    ) -> Option<&'a ModelDescriptor> {
        let sep = self.separator();
        let identifier = identifier.trim_start_matches(sep);
        let relative = qualify(&self.config.models_namespace, identifier, sep);
        models
            .iter()
            .find(|m| m.fully_qualified_name == identifier)
            .or_else(|| models.iter().find(|m| m.fully_qualified_name == relative))
    }

    fn choose_models(
        &self,
        models: Vec<ModelDescriptor>,
        prompt: &mut dyn Prompt,
    ) -> Result<Vec<ModelDescriptor>> {
        let mut options = vec![ALL_MODELS.to_string()];
        options.extend(models.iter().map(|m| m.fully_qualified_name.clone()));

        let chosen = prompt.multi_select("Select a model:", &options)?;
        if chosen.iter().any(|c| c == ALL_MODELS) {
            return Ok(models);
        }
        Ok(models
            .into_iter()
            .filter(|m| chosen.contains(&m.fully_qualified_name))
            .collect())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // sync
    // ─────────────────────────────────────────────────────────────────────────

    pub fn synchronizer(&self) -> PermissionSynchronizer {
        PermissionSynchronizer::new(
            self.scanner.clone(),
            self.config.source.extension.clone(),
            self.config.guards.clone(),
            self.config.sync_permission_group,
        )
    }

    /// Sync permission enums below the requested path into `store`.
    pub async fn sync(
        &self,
        request: &SyncRequest,
        store: &dyn PermissionStore,
        prompt: &mut dyn Prompt,
    ) -> Result<SyncReport> {
        let root: &Path = request
            .path
            .as_deref()
            .unwrap_or(&self.config.sync.search_path);
        let options = SyncOptions {
            clean: request.clean,
            force: request.force,
        };
        self.synchronizer().sync(root, store, options, prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{Answer, AssumeNo, ScriptedPrompt};
    use std::fs;

    fn service(root: &Path) -> PermissionService {
        let mut config = Config::default();
        config.models_path = root.join("app/Models");
        config.output.policies_path = root.join("app/Policies");
        PermissionService::new(config).unwrap()
    }

    fn write_model(root: &Path, name: &str) {
        let dir = root.join("app/Models");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(format!("{}.php", name)),
            format!(
                "<?php\n\nnamespace App\\Models;\n\nuse Illuminate\\Database\\Eloquent\\Model;\n\nclass {} extends Model\n{{\n}}\n",
                name
            ),
        )
        .unwrap();
    }

    #[test]
    fn test_make_named_model_with_policy() {
        let dir = tempfile::tempdir().unwrap();
        write_model(dir.path(), "Order");
        let service = service(dir.path());

        let request = MakeRequest {
            model: Some("App/Models/Order".to_string()),
            policy: true,
            force: false,
        };
        let report = service.make(&request, &mut AssumeNo).unwrap();

        assert_eq!(report.models.len(), 1);
        let order = &report.models[0];
        assert_eq!(order.permission_enum.outcome, ArtifactOutcome::Generated);
        assert_eq!(
            order.permission_enum.path,
            dir.path().join("app/Permissions/OrderPermission.php")
        );
        assert_eq!(
            order.policy.as_ref().unwrap().outcome,
            ArtifactOutcome::Generated
        );
        assert!(dir.path().join("app/Policies/OrderPolicy.php").is_file());
        assert!(report.is_success());
    }

    #[test]
    fn test_make_accepts_name_relative_to_models_namespace() {
        let dir = tempfile::tempdir().unwrap();
        write_model(dir.path(), "Order");
        let report = service(dir.path())
            .make(
                &MakeRequest {
                    model: Some("Order".to_string()),
                    ..MakeRequest::default()
                },
                &mut AssumeNo,
            )
            .unwrap();
        assert_eq!(report.models[0].model.fully_qualified_name, "App\\Models\\Order");
        assert!(report.models[0].policy.is_none());
    }

    #[test]
    fn test_make_unknown_model_declined() {
        let dir = tempfile::tempdir().unwrap();
        write_model(dir.path(), "Order");
        let mut prompt = ScriptedPrompt::new([Answer::Confirm(false)]);

        let err = service(dir.path())
            .make(
                &MakeRequest {
                    model: Some("Invoice".to_string()),
                    ..MakeRequest::default()
                },
                &mut prompt,
            )
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ModelNotFound);
        assert_eq!(prompt.asked(), &[CREATE_MODEL_QUESTION.to_string()]);
    }

    #[test]
    fn test_make_unknown_model_scaffolds() {
        let dir = tempfile::tempdir().unwrap();
        let mut prompt = ScriptedPrompt::new([Answer::Confirm(true)]);

        let report = service(dir.path())
            .make(
                &MakeRequest {
                    model: Some("Billing/Invoice".to_string()),
                    ..MakeRequest::default()
                },
                &mut prompt,
            )
            .unwrap();

        let model_path = dir.path().join("app/Models/Billing/Invoice.php");
        let scaffolded = report.scaffolded.unwrap();
        assert_eq!(scaffolded.path, model_path);
        assert_eq!(scaffolded.outcome, ArtifactOutcome::Generated);

        let source = fs::read_to_string(&model_path).unwrap();
        assert!(source.contains("namespace App\\Models\\Billing;"));
        assert!(source.contains("use Illuminate\\Database\\Eloquent\\Model;"));
        assert!(source.contains("class Invoice extends Model"));

        assert_eq!(
            report.models[0].permission_enum.path,
            dir.path().join("app/Permissions/Billing/InvoicePermission.php")
        );
        let generated = fs::read_to_string(&report.models[0].permission_enum.path).unwrap();
        assert!(generated.contains("namespace App\\Permissions\\Billing;"));
        assert!(generated.contains("case VIEW = 'Invoice.view';"));
    }

    #[test]
    fn test_make_prompts_for_models() {
        let dir = tempfile::tempdir().unwrap();
        write_model(dir.path(), "Order");
        write_model(dir.path(), "Product");
        let service = service(dir.path());

        let mut pick_one =
            ScriptedPrompt::new([Answer::MultiSelect(vec!["App\\Models\\Product".to_string()])]);
        let report = service.make(&MakeRequest::default(), &mut pick_one).unwrap();
        assert_eq!(report.models.len(), 1);
        assert_eq!(report.models[0].model.simple_name, "Product");

        let mut pick_all = ScriptedPrompt::new([
            Answer::MultiSelect(vec![ALL_MODELS.to_string()]),
            Answer::Confirm(false),
        ]);
        let report = service.make(&MakeRequest::default(), &mut pick_all).unwrap();
        let outcomes: Vec<&ArtifactOutcome> =
            report.models.iter().map(|m| &m.permission_enum.outcome).collect();
        // Product already exists from the first run and the overwrite is declined.
        assert_eq!(
            outcomes,
            vec![&ArtifactOutcome::Generated, &ArtifactOutcome::Skipped]
        );
        assert!(report.is_success());
    }

    #[test]
    fn test_make_without_models_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("app/Models")).unwrap();
        let err = service(dir.path())
            .make(&MakeRequest::default(), &mut AssumeNo)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoModelsFound);
    }

    #[test]
    fn test_make_report_success_policy() {
        let failed = ModelReport {
            model: ModelDescriptor {
                fully_qualified_name: "App\\Models\\Order".to_string(),
                simple_name: "Order".to_string(),
                namespace: "App\\Models".to_string(),
                source_file_path: PathBuf::from("Order.php"),
            },
            permission_enum: ArtifactResult {
                path: PathBuf::from("OrderPermission.php"),
                outcome: ArtifactOutcome::Failed {
                    message: "denied".to_string(),
                },
            },
            policy: None,
        };
        let report = MakeReport {
            scaffolded: None,
            models: vec![failed],
        };
        assert!(!report.is_success());
        assert!(MakeReport::default().is_success());
    }
}

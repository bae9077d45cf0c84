//! `make`: generate permission enums and policies.

use anyhow::{bail, Result};
use clap::Args;

use enumperm_core::service::{ArtifactOutcome, ArtifactResult, MakeRequest, ModelReport};
use enumperm_core::PermissionService;

use crate::output::{self, OutputFormat};
use crate::prompt::TerminalPrompt;

#[derive(Args)]
pub struct MakeArgs {
    /// Model name or qualified name (`/` may separate namespace parts).
    /// Omit to choose interactively.
    pub model: Option<String>,

    /// Also generate a policy for each model
    #[arg(short, long)]
    pub policy: bool,

    /// Overwrite existing files without asking
    #[arg(short, long)]
    pub force: bool,
}

pub fn execute(args: MakeArgs, service: &PermissionService, format: OutputFormat) -> Result<()> {
    let request = MakeRequest {
        model: args.model,
        policy: args.policy,
        force: args.force,
    };
    let report = service.make(&request, &mut TerminalPrompt::new())?;

    if format.is_human() {
        if let Some(scaffolded) = &report.scaffolded {
            if scaffolded.outcome.is_written() {
                output::print_success("Model created successfully");
                output::print_detail("path", &scaffolded.path.display().to_string());
            }
        }
        for model in &report.models {
            print_model(model);
        }
    } else {
        output::print_item(&report, format);
    }

    if !report.is_success() {
        bail!("No permission enum could be generated");
    }
    Ok(())
}

fn print_model(report: &ModelReport) {
    print_artifact("Permission enum", &report.model.simple_name, &report.permission_enum);
    if let Some(policy) = &report.policy {
        print_artifact("Policy", &report.model.simple_name, policy);
    }
}

fn print_artifact(kind: &str, model: &str, artifact: &ArtifactResult) {
    match &artifact.outcome {
        ArtifactOutcome::Generated | ArtifactOutcome::Overwritten => {
            output::print_success(&format!("{} generated successfully for {}", kind, model));
            output::print_detail("path", &artifact.path.display().to_string());
        }
        ArtifactOutcome::Skipped => {
            output::print_info(&format!("{} generation skipped for {}", kind, model));
        }
        ArtifactOutcome::Failed { message } => {
            output::print_error(&format!(
                "Failed to generate {} for {}: {}",
                kind.to_lowercase(),
                model,
                message
            ));
        }
    }
}

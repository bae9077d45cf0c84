//! `models`: list the models generation would offer.

use anyhow::Result;
use serde::Serialize;
use tabled::Tabled;

use enumperm_core::discovery::ModelDescriptor;
use enumperm_core::PermissionService;

use crate::output::{self, OutputFormat};

#[derive(Tabled, Serialize)]
struct ModelRow {
    #[tabled(rename = "Model")]
    name: String,
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Permission Enum")]
    permission_enum: String,
    #[tabled(rename = "File")]
    file: String,
}

pub fn execute(service: &PermissionService, format: OutputFormat) -> Result<()> {
    let models = service.models()?;
    let rows: Vec<ModelRow> = models.iter().map(|m| row(service, m)).collect();
    output::print_list(&rows, format);
    Ok(())
}

fn row(service: &PermissionService, model: &ModelDescriptor) -> ModelRow {
    let (namespace, _) = service.layout().enum_target(model);
    ModelRow {
        name: model.simple_name.clone(),
        namespace: model.namespace.clone(),
        permission_enum: service.layout().qualify(
            &namespace,
            &format!("{}{}", model.simple_name, enumperm_core::generator::ENUM_SUFFIX),
        ),
        file: model.source_file_path.display().to_string(),
    }
}

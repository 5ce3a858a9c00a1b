use tracing::info;

use crate::config::MigrateConfig;
use crate::descriptor::SourceDescriptor;
use crate::error::ToolError;
use crate::tool::{Invocation, ToolRunner};

/// `az vm show --name <name> --resource-group <group> --output json`
pub fn describe_invocation(program: &str, name: &str, resource_group: &str) -> Invocation {
    Invocation::new(program)
        .arg("vm")
        .arg("show")
        .flag("name", name)
        .flag("resource-group", resource_group)
        .flag("output", "json")
}

/// Describe a VM in a resource group
#[tracing::instrument(name = "azure.describe", skip(runner, config))]
pub async fn describe<R: ToolRunner + ?Sized>(
    runner: &R,
    config: &MigrateConfig,
    name: &str,
    resource_group: &str,
) -> Result<SourceDescriptor, ToolError> {
    let invocation = describe_invocation(&config.source_cli, name, resource_group);

    let output = runner.run(&invocation).await?;
    output.check(&config.source_cli, config.failure_detection)?;

    let descriptor: SourceDescriptor = output.parse_json(&config.source_cli)?;
    info!("Described VM {} in resource group {}", name, resource_group);

    Ok(descriptor)
}

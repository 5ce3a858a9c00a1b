use tracing::{info, warn};

use crate::config::MigrateConfig;
use crate::descriptor::{InstanceSpec, LaunchResponse, LaunchedInstance};
use crate::error::ToolError;
use crate::tool::{Invocation, ToolRunner};

/// `oci compute instance launch` with the carried-over settings
pub fn launch_invocation(
    program: &str,
    compartment_id: &str,
    subnet_id: &str,
    spec: &InstanceSpec,
    availability_domain: Option<&str>,
) -> Invocation {
    let inv = Invocation::new(program)
        .arg("compute")
        .arg("instance")
        .arg("launch")
        .flag("compartment-id", compartment_id)
        .flag("subnet-id", subnet_id)
        .flag("shape", &spec.shape)
        .flag("display-name", &spec.display_name)
        .flag("image-id", &spec.image_id);

    match availability_domain {
        Some(ad) => inv.flag("availability-domain", ad),
        None => inv,
    }
}

/// Launch an instance; `invocation` comes from [`launch_invocation`]
#[tracing::instrument(name = "oci.launch", skip_all, fields(program = %invocation.program))]
pub async fn launch<R: ToolRunner + ?Sized>(
    runner: &R,
    config: &MigrateConfig,
    invocation: &Invocation,
) -> Result<LaunchedInstance, ToolError> {
    let output = runner.run(invocation).await?;

    if let Err(e) = output.check(&config.destination_cli, config.failure_detection) {
        // The launch may have gone through even though the call is treated as failed
        if let Ok(response) = output.parse_json::<LaunchResponse>(&config.destination_cli) {
            let orphan = LaunchedInstance::from(response);
            warn!(
                "Launch reported failure but returned instance {}; it may need manual cleanup",
                orphan.id
            );
        }
        return Err(e);
    }

    let instance: LaunchedInstance = output
        .parse_json::<LaunchResponse>(&config.destination_cli)?
        .into();
    info!("Launched instance {}", instance.id);

    Ok(instance)
}

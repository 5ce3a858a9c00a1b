use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::cloud::{azure, oci};
use crate::config::MigrateConfig;
use crate::descriptor::{InstanceSpec, LaunchedInstance};
use crate::error::MigrationError;
use crate::migration::lifecycle::{MigrationLifecycle, MigrationStage};
use crate::tool::{Invocation, ToolRunner};

/// The four identifiers a migration run is given
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationRequest {
    /// VM name in the source cloud
    pub source_name: String,
    /// Resource group holding the source VM
    pub source_scope: String,
    /// Compartment the instance is launched into
    pub destination_scope: String,
    /// Subnet the instance is attached to
    pub destination_network: String,
}

impl MigrationRequest {
    pub fn new(
        source_name: impl Into<String>,
        source_scope: impl Into<String>,
        destination_scope: impl Into<String>,
        destination_network: impl Into<String>,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            source_scope: source_scope.into(),
            destination_scope: destination_scope.into(),
            destination_network: destination_network.into(),
        }
    }
}

/// Result of describing and extracting without launching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    pub spec: InstanceSpec,
    /// The launch call a real run would execute
    pub launch: Invocation,
}

/// A completed migration
#[derive(Debug, Clone)]
pub struct MigrationOutcome {
    pub run_id: Uuid,
    pub request: MigrationRequest,
    pub spec: InstanceSpec,
    pub instance: LaunchedInstance,
}

/// Sequences describe -> extract -> create for one VM.
///
/// Every error is terminal for the run. Nothing is retried and nothing
/// created along the way is rolled back.
pub struct Migrator<R> {
    runner: R,
    config: MigrateConfig,
}

impl<R: ToolRunner> Migrator<R> {
    pub fn new(runner: R, config: MigrateConfig) -> Self {
        Self { runner, config }
    }

    /// Copy the source VM's shape, name and image onto a new destination instance
    #[tracing::instrument(
        name = "migration.migrate",
        skip(self, request),
        fields(
            run_id = tracing::field::Empty,
            source_name = %request.source_name,
            source_scope = %request.source_scope,
        )
    )]
    pub async fn migrate(&self, request: &MigrationRequest) -> Result<MigrationOutcome, MigrationError> {
        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));

        let mut lifecycle = MigrationLifecycle::new();
        let result = self.run_all(run_id, request, &mut lifecycle).await;
        settle(&mut lifecycle, &result);

        result
    }

    /// Describe and extract, returning the launch call without executing it
    #[tracing::instrument(
        name = "migration.plan",
        skip(self, request),
        fields(source_name = %request.source_name, source_scope = %request.source_scope)
    )]
    pub async fn plan(&self, request: &MigrationRequest) -> Result<MigrationPlan, MigrationError> {
        let mut lifecycle = MigrationLifecycle::new();
        let result = self.prepare(request, &mut lifecycle).await;
        settle(&mut lifecycle, &result);

        result
    }

    async fn run_all(
        &self,
        run_id: Uuid,
        request: &MigrationRequest,
        lifecycle: &mut MigrationLifecycle,
    ) -> Result<MigrationOutcome, MigrationError> {
        let MigrationPlan { spec, launch } = self.prepare(request, lifecycle).await?;

        lifecycle.transition_to(MigrationStage::Creating)?;
        let instance = oci::launch(&self.runner, &self.config, &launch)
            .await
            .map_err(MigrationError::Create)?;

        lifecycle.transition_to(MigrationStage::Completed)?;
        info!(
            "Migrated {} to instance {}",
            request.source_name, instance.id
        );

        Ok(MigrationOutcome {
            run_id,
            request: request.clone(),
            spec,
            instance,
        })
    }

    async fn prepare(
        &self,
        request: &MigrationRequest,
        lifecycle: &mut MigrationLifecycle,
    ) -> Result<MigrationPlan, MigrationError> {
        lifecycle.transition_to(MigrationStage::Describing)?;
        let descriptor = azure::describe(
            &self.runner,
            &self.config,
            &request.source_name,
            &request.source_scope,
        )
        .await
        .map_err(MigrationError::Describe)?;

        lifecycle.transition_to(MigrationStage::Extracting)?;
        let spec = InstanceSpec::try_from(descriptor)?;

        let launch = oci::launch_invocation(
            &self.config.destination_cli,
            &request.destination_scope,
            &request.destination_network,
            &spec,
            self.config.availability_domain.as_deref(),
        );

        Ok(MigrationPlan { spec, launch })
    }
}

fn settle<T>(lifecycle: &mut MigrationLifecycle, result: &Result<T, MigrationError>) {
    if let Err(e) = result {
        info!("Migration failed while {}: {}", lifecycle.current_stage(), e);
        lifecycle.fail();
    }
}

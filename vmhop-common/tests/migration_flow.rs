//! Orchestrator tests against a scripted runner.
//!
//! The runner answers by program name and records every invocation, so the
//! tests can check exactly what would have been passed to `az` and `oci`
//! without either CLI installed.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;
use vmhop_common::{
    DescriptorError, FailureDetection, Invocation, MigrateConfig, MigrationError,
    MigrationRequest, Migrator, ToolError, ToolOutput, ToolRunner,
};

/// Answers each program with a canned output and records what was run.
#[derive(Clone, Default)]
struct ScriptedRunner {
    responses: Arc<HashMap<String, ToolOutput>>,
    calls: Arc<Mutex<Vec<Invocation>>>,
}

impl ScriptedRunner {
    fn new(responses: Vec<(&str, ToolOutput)>) -> Self {
        Self {
            responses: Arc::new(
                responses
                    .into_iter()
                    .map(|(program, output)| (program.to_string(), output))
                    .collect(),
            ),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    async fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().await.clone()
    }

    async fn calls_to(&self, program: &str) -> Vec<Invocation> {
        self.calls()
            .await
            .into_iter()
            .filter(|inv| inv.program == program)
            .collect()
    }
}

#[async_trait]
impl ToolRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ToolOutput, ToolError> {
        self.calls.lock().await.push(invocation.clone());

        self.responses
            .get(&invocation.program)
            .cloned()
            .ok_or_else(|| ToolError::Spawn {
                program: invocation.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not scripted"),
            })
    }
}

fn json_output(value: &serde_json::Value) -> ToolOutput {
    ToolOutput::success(serde_json::to_vec(value).unwrap())
}

fn failed_output(stderr: &str) -> ToolOutput {
    ToolOutput {
        exit_code: Some(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

fn vm1_descriptor() -> ToolOutput {
    json_output(&json!({
        "name": "vm1",
        "resourceGroup": "rg1",
        "hardwareProfile": {"vmSize": "Standard_B1s"},
        "storageProfile": {"imageReference": {"id": "img-123"}}
    }))
}

fn launched(id: &str) -> ToolOutput {
    json_output(&json!({
        "data": {
            "id": id,
            "display-name": "vm1",
            "lifecycle-state": "PROVISIONING"
        }
    }))
}

fn request() -> MigrationRequest {
    MigrationRequest::new(
        "vm1",
        "rg1",
        "ocid1.compartment.oc1..x",
        "ocid1.subnet.oc1..y",
    )
}

#[tokio::test]
async fn test_successful_migration_passes_extracted_fields() {
    let runner = ScriptedRunner::new(vec![
        ("az", vm1_descriptor()),
        ("oci", launched("ocid1.instance.oc1..new")),
    ]);
    let migrator = Migrator::new(runner.clone(), MigrateConfig::new());

    let outcome = migrator.migrate(&request()).await.unwrap();

    assert_eq!(outcome.instance.id, "ocid1.instance.oc1..new");
    assert_eq!(outcome.spec.shape, "Standard_B1s");
    assert_eq!(outcome.spec.display_name, "vm1");
    assert_eq!(outcome.spec.image_id, "img-123");

    let calls = runner.calls().await;
    assert_eq!(calls.len(), 2);

    let describe = &calls[0];
    assert_eq!(describe.program, "az");
    assert_eq!(describe.flag_value("name"), Some("vm1"));
    assert_eq!(describe.flag_value("resource-group"), Some("rg1"));

    let create = &calls[1];
    assert_eq!(create.program, "oci");
    assert_eq!(create.flag_value("compartment-id"), Some("ocid1.compartment.oc1..x"));
    assert_eq!(create.flag_value("subnet-id"), Some("ocid1.subnet.oc1..y"));
    assert_eq!(create.flag_value("shape"), Some("Standard_B1s"));
    assert_eq!(create.flag_value("display-name"), Some("vm1"));
    assert_eq!(create.flag_value("image-id"), Some("img-123"));
}

#[tokio::test]
async fn test_describe_stderr_never_invokes_creator() {
    let runner = ScriptedRunner::new(vec![
        (
            "az",
            ToolOutput {
                exit_code: Some(0),
                stdout: b"{}".to_vec(),
                stderr: b"ERROR: (ResourceNotFound) The Resource 'vm1' was not found.".to_vec(),
            },
        ),
        ("oci", launched("ocid1.instance.oc1..new")),
    ]);
    let migrator = Migrator::new(runner.clone(), MigrateConfig::new());

    let err = migrator.migrate(&request()).await.unwrap_err();

    assert!(matches!(err, MigrationError::Describe(ToolError::Stderr { .. })));
    assert!(runner.calls_to("oci").await.is_empty());
}

#[tokio::test]
async fn test_create_stderr_reports_no_identifier() {
    // stdout still carries an instance; the call is failed regardless
    let mut create = launched("ocid1.instance.oc1..orphan");
    create.stderr = b"ServiceError: LimitExceeded".to_vec();

    let runner = ScriptedRunner::new(vec![("az", vm1_descriptor()), ("oci", create)]);
    let migrator = Migrator::new(runner.clone(), MigrateConfig::new());

    let err = migrator.migrate(&request()).await.unwrap_err();

    match err {
        MigrationError::Create(ToolError::Stderr { program, stderr }) => {
            assert_eq!(program, "oci");
            assert!(stderr.contains("LimitExceeded"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(runner.calls_to("oci").await.len(), 1);
}

#[tokio::test]
async fn test_missing_field_is_distinguishable_and_skips_create() {
    let runner = ScriptedRunner::new(vec![
        (
            "az",
            json_output(&json!({
                "name": "vm1",
                "hardwareProfile": {"vmSize": "Standard_B1s"},
                "storageProfile": {"imageReference": {"publisher": "Canonical"}}
            })),
        ),
        ("oci", launched("ocid1.instance.oc1..new")),
    ]);
    let migrator = Migrator::new(runner.clone(), MigrateConfig::new());

    let err = migrator.migrate(&request()).await.unwrap_err();

    assert!(matches!(
        err,
        MigrationError::Descriptor(DescriptorError::MissingField(
            "storageProfile.imageReference.id"
        ))
    ));
    assert!(runner.calls_to("oci").await.is_empty());
}

#[tokio::test]
async fn test_non_json_describe_output_is_malformed() {
    let runner = ScriptedRunner::new(vec![(
        "az",
        ToolOutput::success("Name    ResourceGroup    Location\n------  ---------------  --------"),
    )]);
    let migrator = Migrator::new(runner, MigrateConfig::new());

    let err = migrator.migrate(&request()).await.unwrap_err();

    assert!(matches!(
        err,
        MigrationError::Describe(ToolError::MalformedOutput { .. })
    ));
}

#[tokio::test]
async fn test_exit_status_detection_tolerates_warnings() {
    let mut describe = vm1_descriptor();
    describe.stderr = b"WARNING: This command is in preview".to_vec();

    let runner = ScriptedRunner::new(vec![
        ("az", describe),
        ("oci", launched("ocid1.instance.oc1..new")),
    ]);
    let config = MigrateConfig::new().with_failure_detection(FailureDetection::ExitStatus);
    let migrator = Migrator::new(runner, config);

    let outcome = migrator.migrate(&request()).await.unwrap();
    assert_eq!(outcome.instance.id, "ocid1.instance.oc1..new");
}

#[tokio::test]
async fn test_exit_status_detection_fails_on_nonzero_exit() {
    let runner = ScriptedRunner::new(vec![
        ("az", vm1_descriptor()),
        ("oci", failed_output("")),
    ]);
    let config = MigrateConfig::new().with_failure_detection(FailureDetection::ExitStatus);
    let migrator = Migrator::new(runner, config);

    let err = migrator.migrate(&request()).await.unwrap_err();
    assert!(matches!(
        err,
        MigrationError::Create(ToolError::ExitStatus { code: Some(1), .. })
    ));
}

#[tokio::test]
async fn test_plan_does_not_invoke_creator() {
    let runner = ScriptedRunner::new(vec![
        ("az", vm1_descriptor()),
        ("oci", launched("ocid1.instance.oc1..new")),
    ]);
    let config = MigrateConfig::new().with_availability_domain("Uocm:PHX-AD-1");
    let migrator = Migrator::new(runner.clone(), config);

    let plan = migrator.plan(&request()).await.unwrap();

    assert_eq!(plan.launch.program, "oci");
    assert_eq!(plan.launch.flag_value("shape"), Some("Standard_B1s"));
    assert_eq!(plan.launch.flag_value("availability-domain"), Some("Uocm:PHX-AD-1"));
    assert!(runner.calls_to("oci").await.is_empty());
}

#[tokio::test]
async fn test_configured_programs_are_used() {
    let runner = ScriptedRunner::new(vec![
        ("/opt/az", vm1_descriptor()),
        ("/opt/oci", launched("ocid1.instance.oc1..new")),
    ]);
    let config = MigrateConfig::new().with_programs("/opt/az", "/opt/oci");
    let migrator = Migrator::new(runner.clone(), config);

    migrator.migrate(&request()).await.unwrap();

    let programs: Vec<String> = runner.calls().await.into_iter().map(|c| c.program).collect();
    assert_eq!(programs, vec!["/opt/az", "/opt/oci"]);
}

#[tokio::test]
async fn test_retry_after_failure_is_independent() {
    let failing = ScriptedRunner::new(vec![("az", failed_output("ERROR: throttled"))]);
    let migrator = Migrator::new(failing, MigrateConfig::new());
    assert!(migrator.migrate(&request()).await.is_err());

    let healthy = ScriptedRunner::new(vec![
        ("az", vm1_descriptor()),
        ("oci", launched("ocid1.instance.oc1..new")),
    ]);
    let migrator = Migrator::new(healthy, MigrateConfig::new());
    let outcome = migrator.migrate(&request()).await.unwrap();

    assert_eq!(outcome.instance.id, "ocid1.instance.oc1..new");
}

#[tokio::test]
async fn test_each_run_gets_a_fresh_run_id() {
    let runner = ScriptedRunner::new(vec![
        ("az", vm1_descriptor()),
        ("oci", launched("ocid1.instance.oc1..new")),
    ]);
    let migrator = Migrator::new(runner, MigrateConfig::new());

    let first = migrator.migrate(&request()).await.unwrap();
    let second = migrator.migrate(&request()).await.unwrap();

    assert_ne!(first.run_id, second.run_id);
}

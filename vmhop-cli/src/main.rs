mod report;
mod telemetry;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use report::OutputFormat;
use tracing::debug;
use vmhop_common::config::{ENV_AVAILABILITY_DOMAIN, ENV_FAILURE_DETECTION, ENV_TOOL_TIMEOUT_SECS};
use vmhop_common::{
    FailureDetection, MigrateConfig, MigrationError, MigrationRequest, Migrator, ProcessRunner,
};

/// Exit code for a wrong argument count or unusable configuration
const EXIT_USAGE: u8 = 1;

#[derive(Parser)]
#[command(name = "migrate")]
#[command(version = "0.1.0")]
#[command(about = "Copy an Azure VM's size, image and name onto a new OCI instance", long_about = None)]
struct Cli {
    /// Name of the Azure VM to copy
    #[arg(value_name = "source-name")]
    source_name: String,

    /// Azure resource group holding the VM
    #[arg(value_name = "source-scope")]
    source_scope: String,

    /// OCI compartment OCID for the new instance
    #[arg(value_name = "destination-scope")]
    destination_scope: String,

    /// OCI subnet OCID for the new instance
    #[arg(value_name = "destination-network")]
    destination_network: String,

    /// Describe the source and print the launch command without running it
    #[arg(long)]
    dry_run: bool,

    /// Report format
    #[arg(long, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Per-call timeout in seconds, 0 waits forever (default: 600)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// How a CLI call is judged to have failed (default: stderr)
    #[arg(long, value_enum)]
    failure_detection: Option<FailureDetectionArg>,

    /// OCI availability domain for the new instance
    #[arg(long, value_name = "AD")]
    availability_domain: Option<String>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FailureDetectionArg {
    /// Any stderr output fails the call
    Stderr,
    /// Only a non-zero exit status fails the call
    ExitStatus,
}

impl From<FailureDetectionArg> for FailureDetection {
    fn from(arg: FailureDetectionArg) -> Self {
        match arg {
            FailureDetectionArg::Stderr => FailureDetection::AnyStderr,
            FailureDetectionArg::ExitStatus => FailureDetection::ExitStatus,
        }
    }
}

impl Cli {
    fn request(&self) -> MigrationRequest {
        MigrationRequest::new(
            &self.source_name,
            &self.source_scope,
            &self.destination_scope,
            &self.destination_network,
        )
    }

    /// Value a flag supplies for a configuration variable, in its env form
    fn flag_override(&self, key: &str) -> Option<String> {
        match key {
            ENV_TOOL_TIMEOUT_SECS => self.timeout.map(|secs| secs.to_string()),
            ENV_FAILURE_DETECTION => self
                .failure_detection
                .map(|arg| FailureDetection::from(arg).to_string()),
            ENV_AVAILABILITY_DOMAIN => self.availability_domain.clone(),
            _ => None,
        }
    }

    /// Flags win over the environment; an overridden variable is never read
    fn config(&self) -> Result<MigrateConfig> {
        MigrateConfig::from_lookup(|key| {
            self.flag_override(key).or_else(|| std::env::var(key).ok())
        })
        .context("Invalid configuration")
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return usage_error(&err),
    };

    telemetry::init_logging();

    let config = match cli.config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::from(EXIT_USAGE);
        }
    };
    debug!(?config, "Resolved configuration");

    let migrator = Migrator::new(ProcessRunner::new(config.tool_timeout), config);
    let request = cli.request();

    let rendered = if cli.dry_run {
        match migrator.plan(&request).await {
            Ok(plan) => report::render_plan(&plan, cli.output),
            Err(e) => return migration_failed(&e),
        }
    } else {
        match migrator.migrate(&request).await {
            Ok(outcome) => report::render_outcome(&outcome, cli.output),
            Err(e) => return migration_failed(&e),
        }
    };

    match rendered {
        Ok(text) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// `--help` and `--version` exit normally; anything else prints usage to stdout and exits 1
fn usage_error(err: &clap::Error) -> ExitCode {
    use clap::error::ErrorKind;

    if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
        // Printing help/version only fails if stdout is gone
        let _ = err.print();
        return ExitCode::SUCCESS;
    }

    eprint!("{}", err.render());
    println!("{}", Cli::command().render_usage());
    println!("Run 'migrate --help' for more information.");
    ExitCode::from(EXIT_USAGE)
}

fn migration_failed(err: &MigrationError) -> ExitCode {
    eprintln!("Error: {err}");
    ExitCode::from(exit_code(err))
}

fn exit_code(err: &MigrationError) -> u8 {
    match err {
        MigrationError::Describe(_) => 2,
        MigrationError::Descriptor(_) => 3,
        MigrationError::Create(_) => 4,
        MigrationError::Lifecycle(_) => 70,
    }
}

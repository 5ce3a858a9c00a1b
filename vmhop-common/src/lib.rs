pub mod cloud;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod migration;
pub mod tool;

// Re-export commonly used types
pub use config::{FailureDetection, MigrateConfig};
pub use error::{ConfigError, DescriptorError, MigrationError, ToolError};
pub use migration::{MigrationOutcome, MigrationPlan, MigrationRequest, Migrator};
pub use tool::{Invocation, ProcessRunner, ToolOutput, ToolRunner};

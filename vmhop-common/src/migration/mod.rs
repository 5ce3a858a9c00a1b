pub mod lifecycle;
pub mod orchestrator;

pub use lifecycle::{InvalidTransition, MigrationLifecycle, MigrationStage};
pub use orchestrator::{MigrationOutcome, MigrationPlan, MigrationRequest, Migrator};

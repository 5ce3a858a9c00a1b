use thiserror::Error;

/// Stages of a single migration run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStage {
    /// Nothing has been invoked yet
    Pending,
    /// Waiting on the source CLI
    Describing,
    /// Pulling launch settings out of the descriptor
    Extracting,
    /// Waiting on the destination CLI
    Creating,
    /// Destination instance reported back
    Completed,
    /// The run hit a terminal error
    Failed,
}

impl std::fmt::Display for MigrationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrationStage::Pending => write!(f, "Pending"),
            MigrationStage::Describing => write!(f, "Describing"),
            MigrationStage::Extracting => write!(f, "Extracting"),
            MigrationStage::Creating => write!(f, "Creating"),
            MigrationStage::Completed => write!(f, "Completed"),
            MigrationStage::Failed => write!(f, "Failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid migration stage transition from {from} to {to}")]
pub struct InvalidTransition {
    pub from: MigrationStage,
    pub to: MigrationStage,
}

/// Tracks the stage of a run and rejects out-of-order transitions
#[derive(Debug)]
pub struct MigrationLifecycle {
    stage: MigrationStage,
}

impl MigrationLifecycle {
    /// Create a new lifecycle in the Pending stage
    pub fn new() -> Self {
        Self {
            stage: MigrationStage::Pending,
        }
    }

    pub fn current_stage(&self) -> MigrationStage {
        self.stage
    }

    /// Transition to a new stage, validating the transition is legal
    pub fn transition_to(&mut self, next: MigrationStage) -> Result<(), InvalidTransition> {
        // Completed and Failed are terminal; any live stage may fail
        let is_valid = !self.is_terminal()
            && matches!(
                (self.stage, next),
                (_, MigrationStage::Failed)
                    | (MigrationStage::Pending, MigrationStage::Describing)
                    | (MigrationStage::Describing, MigrationStage::Extracting)
                    | (MigrationStage::Extracting, MigrationStage::Creating)
                    | (MigrationStage::Creating, MigrationStage::Completed)
            );

        if !is_valid {
            return Err(InvalidTransition {
                from: self.stage,
                to: next,
            });
        }

        tracing::debug!("migration stage {} -> {}", self.stage, next);
        self.stage = next;
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.stage, MigrationStage::Completed | MigrationStage::Failed)
    }

    /// Mark the run failed unless it already reached a terminal stage
    pub fn fail(&mut self) {
        if !self.is_terminal() {
            self.stage = MigrationStage::Failed;
        }
    }
}

impl Default for MigrationLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

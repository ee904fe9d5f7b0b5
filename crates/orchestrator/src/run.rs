use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::state_machine::{RunState, RunStateMachine};

/// A phase that finished successfully within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseRecord {
    pub name: String,
    pub elapsed_ms: u64,
}

/// Mutable bookkeeping for one invocation, owned by the provisioner.
#[derive(Debug)]
pub struct ProvisionRun {
    id: Uuid,
    state: RunState,
    completed: Vec<PhaseRecord>,
    halted_at: Option<String>,
    error: Option<String>,
    started: Instant,
}

impl ProvisionRun {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            state: RunState::NotStarted,
            completed: Vec::new(),
            halted_at: None,
            error: None,
            started: Instant::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn transition(&mut self, to: RunState) -> Result<()> {
        RunStateMachine::validate_transition(&self.state, &to)?;
        debug!(run_id = %self.id, from = %self.state, to = %to, "Run state transition");
        self.state = to;
        Ok(())
    }

    pub fn record_completed(&mut self, phase: &str, elapsed: Duration) {
        self.completed.push(PhaseRecord {
            name: phase.to_string(),
            elapsed_ms: elapsed.as_millis() as u64,
        });
    }

    pub fn halt_at(&mut self, phase: &str) {
        self.halted_at = Some(phase.to_string());
    }

    pub fn record_error(&mut self, cause: impl Into<String>) {
        self.error = Some(cause.into());
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn completed(&self) -> &[PhaseRecord] {
        &self.completed
    }

    pub fn halted_early(&self) -> bool {
        self.halted_at.is_some()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn into_report(self) -> ProvisionReport {
        ProvisionReport {
            run_id: self.id,
            state: self.state,
            elapsed_ms: self.started.elapsed().as_millis() as u64,
            phases: self.completed,
            halted_at: self.halted_at,
        }
    }
}

/// Outcome of a successful run: either every phase completed or the run
/// stopped on purpose at a checkpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionReport {
    pub run_id: Uuid,
    pub state: RunState,
    pub phases: Vec<PhaseRecord>,
    pub halted_at: Option<String>,
    pub elapsed_ms: u64,
}

impl ProvisionReport {
    pub fn is_halted(&self) -> bool {
        self.halted_at.is_some()
    }

    pub fn completed_phases(&self) -> Vec<&str> {
        self.phases.iter().map(|p| p.name.as_str()).collect()
    }
}

use std::fmt;

use serde::Serialize;

use crate::error::{ProvisionError, Result};

/// Lifecycle of one provisioning run. Indices refer to registry positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "phase", rename_all = "snake_case")]
pub enum RunState {
    NotStarted,
    Running(usize),
    Completed,
    Failed(usize),
    HaltedAtCheckpoint(usize),
    Cancelled(usize),
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunState::NotStarted | RunState::Running(_))
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::NotStarted => f.write_str("not_started"),
            RunState::Running(i) => write!(f, "running({})", i),
            RunState::Completed => f.write_str("completed"),
            RunState::Failed(i) => write!(f, "failed({})", i),
            RunState::HaltedAtCheckpoint(i) => write!(f, "halted_at_checkpoint({})", i),
            RunState::Cancelled(i) => write!(f, "cancelled({})", i),
        }
    }
}

pub struct RunStateMachine;

impl RunStateMachine {
    pub fn validate_transition(from: &RunState, to: &RunState) -> Result<()> {
        if Self::is_allowed(from, to) {
            Ok(())
        } else {
            Err(ProvisionError::InvalidTransition {
                from: from.to_string(),
                to: to.to_string(),
            })
        }
    }

    fn is_allowed(from: &RunState, to: &RunState) -> bool {
        match (from, to) {
            // An empty registry completes without running anything
            (RunState::NotStarted, RunState::Running(0) | RunState::Completed) => true,
            (RunState::Running(i), RunState::Running(j)) => *j == i + 1,
            (RunState::Running(_), RunState::Completed) => true,
            (
                RunState::Running(i),
                RunState::Failed(j) | RunState::HaltedAtCheckpoint(j) | RunState::Cancelled(j),
            ) => i == j,
            _ => false,
        }
    }

    pub fn can_transition(from: &RunState, to: &RunState) -> bool {
        Self::validate_transition(from, to).is_ok()
    }
}

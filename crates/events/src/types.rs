//! Event types emitted during a provisioning run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping all events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// Position of this event in the emitting run
    pub sequence: u64,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: Event,
}

impl EventEnvelope {
    /// Create a new event envelope with auto-generated ID and timestamp
    pub fn new(event: Event) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence: 0,
            timestamp: Utc::now(),
            event,
        }
    }

    /// Attach the emitter's sequence number
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }
}

/// How a provisioning run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    Halted { phase: String },
    Failed { phase: Option<String> },
    Cancelled { phase: Option<String> },
}

/// Step transitions of a provisioning run.
///
/// Every phase produces exactly one `step.started` followed by exactly one
/// of `step.completed` or `step.failed`. A run ends with one `run.finished`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "step.started")]
    StepStarted {
        run_id: Uuid,
        phase: String,
        title: String,
        estimated_minutes: u32,
    },

    #[serde(rename = "step.completed")]
    StepCompleted {
        run_id: Uuid,
        phase: String,
        elapsed_ms: u64,
    },

    #[serde(rename = "step.failed")]
    StepFailed {
        run_id: Uuid,
        phase: String,
        cause: String,
        elapsed_ms: u64,
    },

    #[serde(rename = "run.finished")]
    RunFinished {
        run_id: Uuid,
        outcome: RunOutcome,
        elapsed_ms: u64,
    },
}

impl Event {
    /// Name of the phase this event belongs to, if it is a step event
    pub fn phase(&self) -> Option<&str> {
        match self {
            Event::StepStarted { phase, .. } => Some(phase),
            Event::StepCompleted { phase, .. } => Some(phase),
            Event::StepFailed { phase, .. } => Some(phase),
            Event::RunFinished { .. } => None,
        }
    }

    pub fn run_id(&self) -> Uuid {
        match self {
            Event::StepStarted { run_id, .. } => *run_id,
            Event::StepCompleted { run_id, .. } => *run_id,
            Event::StepFailed { run_id, .. } => *run_id,
            Event::RunFinished { run_id, .. } => *run_id,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Event::StepStarted { .. })
    }
}

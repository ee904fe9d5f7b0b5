//! Step reporting capability.
//!
//! The provisioner calls `begin_step` once per step, followed by exactly one
//! `complete_step` or `fail_step`. Implementations render that sequence to an
//! operator, an event bus, or nowhere.

use std::error::Error;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use events::{Event, RunOutcome};
use uuid::Uuid;

use crate::core::{OrderedEventEmitter, Phase};

/// What the reporter is told when a step begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub name: String,
    pub title: String,
    pub estimated_minutes: u32,
}

impl Step {
    pub fn new(name: impl Into<String>, title: impl Into<String>, estimated_minutes: u32) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            estimated_minutes,
        }
    }

    pub fn for_phase(phase: &dyn Phase) -> Self {
        Self::new(phase.name(), phase.title(), phase.estimated_minutes())
    }
}

pub trait StepReporter: Send + Sync {
    fn begin_step(&self, step: &Step);

    fn complete_step(&self);

    fn fail_step(&self, error: &(dyn Error + 'static));

    /// Called once when the run ends, whatever the outcome.
    fn finish_run(&self, _outcome: &RunOutcome) {}
}

/// Renders every error in a source chain, outermost first.
pub fn error_chain(error: &(dyn Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl StepReporter for NoopReporter {
    fn begin_step(&self, _step: &Step) {}

    fn complete_step(&self) {}

    fn fail_step(&self, _error: &(dyn Error + 'static)) {}
}

/// Forwards every call to each inner reporter in order.
#[derive(Default, Clone)]
pub struct FanoutReporter {
    reporters: Vec<Arc<dyn StepReporter>>,
}

impl FanoutReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, reporter: Arc<dyn StepReporter>) -> Self {
        self.reporters.push(reporter);
        self
    }

    pub fn len(&self) -> usize {
        self.reporters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reporters.is_empty()
    }
}

impl StepReporter for FanoutReporter {
    fn begin_step(&self, step: &Step) {
        for reporter in &self.reporters {
            reporter.begin_step(step);
        }
    }

    fn complete_step(&self) {
        for reporter in &self.reporters {
            reporter.complete_step();
        }
    }

    fn fail_step(&self, error: &(dyn Error + 'static)) {
        for reporter in &self.reporters {
            reporter.fail_step(error);
        }
    }

    fn finish_run(&self, outcome: &RunOutcome) {
        for reporter in &self.reporters {
            reporter.finish_run(outcome);
        }
    }
}

/// Publishes step transitions as [`Event`]s.
pub struct EventBusReporter {
    emitter: OrderedEventEmitter,
    run_id: Uuid,
    run_started: Instant,
    current: Mutex<Option<(String, Instant)>>,
}

impl EventBusReporter {
    pub fn new(emitter: OrderedEventEmitter, run_id: Uuid) -> Self {
        Self {
            emitter,
            run_id,
            run_started: Instant::now(),
            current: Mutex::new(None),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    fn take_current(&self) -> (String, u64) {
        let current = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match current {
            Some((phase, started)) => (phase, started.elapsed().as_millis() as u64),
            None => (String::new(), 0),
        }
    }
}

impl StepReporter for EventBusReporter {
    fn begin_step(&self, step: &Step) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) =
            Some((step.name.clone(), Instant::now()));
        self.emitter.emit(Event::StepStarted {
            run_id: self.run_id,
            phase: step.name.clone(),
            title: step.title.clone(),
            estimated_minutes: step.estimated_minutes,
        });
    }

    fn complete_step(&self) {
        let (phase, elapsed_ms) = self.take_current();
        self.emitter.emit(Event::StepCompleted {
            run_id: self.run_id,
            phase,
            elapsed_ms,
        });
    }

    fn fail_step(&self, error: &(dyn Error + 'static)) {
        let (phase, elapsed_ms) = self.take_current();
        self.emitter.emit(Event::StepFailed {
            run_id: self.run_id,
            phase,
            cause: error_chain(error),
            elapsed_ms,
        });
    }

    fn finish_run(&self, outcome: &RunOutcome) {
        self.emitter.emit(Event::RunFinished {
            run_id: self.run_id,
            outcome: outcome.clone(),
            elapsed_ms: self.run_started.elapsed().as_millis() as u64,
        });
    }
}

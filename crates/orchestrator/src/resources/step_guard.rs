//! RAII guard for step lifecycle management.
//!
//! A step that is begun must end with exactly one completion or failure,
//! including when the run future is dropped mid-phase.

use std::error::Error;

use tracing::{debug, warn};

use crate::error::PhaseError;
use crate::reporter::{Step, StepReporter};

/// Begins a step on creation and fails it on drop unless resolved first.
///
/// ```ignore
/// let guard = StepGuard::begin(reporter, &step);
/// // ... run the phase ...
/// guard.complete(); // or guard.fail(&err)
/// ```
pub struct StepGuard<'a> {
    reporter: &'a dyn StepReporter,
    step: String,
    resolved: bool,
}

impl<'a> StepGuard<'a> {
    pub fn begin(reporter: &'a dyn StepReporter, step: &Step) -> Self {
        debug!(step = %step.name, "Step started");
        reporter.begin_step(step);
        Self {
            reporter,
            step: step.name.clone(),
            resolved: false,
        }
    }

    pub fn complete(mut self) {
        debug!(step = %self.step, "Step completed");
        self.resolved = true;
        self.reporter.complete_step();
    }

    pub fn fail(mut self, error: &(dyn Error + 'static)) {
        debug!(step = %self.step, error = %error, "Step failed");
        self.resolved = true;
        self.reporter.fail_step(error);
    }

    pub fn step(&self) -> &str {
        &self.step
    }
}

impl Drop for StepGuard<'_> {
    fn drop(&mut self) {
        if !self.resolved {
            warn!(step = %self.step, "Step guard dropped without completion - failing step");
            self.reporter.fail_step(&PhaseError::Failed(
                "step interrupted before completion".to_string(),
            ));
        }
    }
}

//! Core abstractions of the provisioning model.
//!
//! - [`Phase`] - Trait that all provisioning phases implement
//! - [`PhaseContext`] - What a phase sees while it runs
//! - [`Provisioner`] - Runs a phase registry under a run context
//! - [`OrderedEventEmitter`] - Event emitter with sequence guarantees

mod events;
mod execution;
mod phase;

pub use events::OrderedEventEmitter;
pub use execution::{Provisioner, VALIDATE_CONFIG_STEP};
pub use phase::{Phase, PhaseContext, DEFAULT_PHASE_TIMEOUT};

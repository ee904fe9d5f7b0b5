//! Staged provisioning of a Harvester management cluster.
//!
//! A [`Provisioner`] walks the phases of a [`PhaseRegistry`] in order,
//! reporting each as a step, and stops early on failure, cancellation or a
//! requested checkpoint.

pub mod cancel;
pub mod core;
pub mod error;
pub mod gate;
pub mod manifests;
pub mod phases;
pub mod registry;
pub mod reporter;
pub mod resources;
pub mod run;
pub mod state_machine;

pub use cancel::{CancelSignal, CancellationHandle, RunContext};
pub use crate::core::{OrderedEventEmitter, Phase, PhaseContext, Provisioner};
pub use error::{PhaseError, PhaseResult, ProvisionError, Result};
pub use gate::ConfigGate;
pub use phases::{management_registry, PhaseServices};
pub use registry::{PhaseRegistry, PhaseRegistryBuilder, RegistryError};
pub use reporter::{EventBusReporter, FanoutReporter, NoopReporter, Step, StepReporter};
pub use run::{PhaseRecord, ProvisionReport, ProvisionRun};
pub use state_machine::{RunState, RunStateMachine};

//! Step events for provisioning runs
//!
//! This crate provides the event bus and the event types emitted while a
//! provisioning run moves through its phases.

mod bus;
mod types;

pub use bus::{EventBus, RunObserver};
pub use types::*;

//! Domain types shared by the provisioning workspace.
//!
//! Everything in this crate is plain data: the raw inputs collected by the
//! command line, the validated [`ProvisionConfig`] handed to every phase, the
//! application catalog, and the [`ValidationError`] raised when inputs cannot
//! be turned into a configuration.

pub mod domain;
pub mod error;

pub use domain::*;
pub use error::{Result, ValidationError};

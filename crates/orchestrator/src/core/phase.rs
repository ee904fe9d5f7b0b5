//! Phase trait and the context every phase runs with.
//!
//! A phase is one ordered, named unit of provisioning work. Phases are
//! expected to be idempotent so that a halted or failed run can be resumed
//! by invoking the provisioner again with the same configuration.

use std::time::Duration;

use async_trait::async_trait;
use cluster::ClusterClient;
use platform_core::{CatalogApp, ProvisionConfig};

use crate::cancel::CancelSignal;
use crate::error::PhaseResult;

/// Deadline applied to phases that do not declare their own.
pub const DEFAULT_PHASE_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Everything a phase may read or call while it runs.
pub struct PhaseContext<'a> {
    pub config: &'a ProvisionConfig,
    pub catalog_apps: &'a [CatalogApp],
    pub cluster: &'a dyn ClusterClient,
    pub cancel: CancelSignal,
}

impl PhaseContext<'_> {
    /// Fail fast between steps of a long phase.
    pub fn check_cancelled(&self) -> PhaseResult {
        if self.cancel.is_cancelled() {
            Err(crate::error::PhaseError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Core trait that all provisioning phases implement.
#[async_trait]
pub trait Phase: Send + Sync {
    /// Unique, stable identifier (e.g. `install-argocd`).
    fn name(&self) -> &str;

    /// Short alias accepted by `--stop-after`.
    fn checkpoint(&self) -> Option<&str> {
        None
    }

    /// Human readable step title.
    fn title(&self) -> &str;

    fn estimated_minutes(&self) -> u32 {
        1
    }

    /// Upper bound on a single execution of [`Phase::run`].
    fn timeout(&self) -> Duration {
        DEFAULT_PHASE_TIMEOUT
    }

    /// Whether `selector` names this phase or its checkpoint.
    fn matches(&self, selector: &str) -> bool {
        self.name() == selector || self.checkpoint() == Some(selector)
    }

    async fn run(&self, ctx: &PhaseContext<'_>) -> PhaseResult;
}

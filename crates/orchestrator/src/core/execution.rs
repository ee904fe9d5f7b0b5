//! The provisioner: runs registry phases in order under one run context.

use std::sync::Arc;
use std::time::Instant;

use cluster::ClusterClient;
use events::RunOutcome;
use platform_core::{Catalog, CatalogApp, ProvisionConfig, ProvisionInputs, ValidationError};
use tracing::{error, info, warn};

use crate::cancel::RunContext;
use crate::error::{PhaseError, ProvisionError, Result};
use crate::gate::ConfigGate;
use crate::registry::PhaseRegistry;
use crate::reporter::{Step, StepReporter};
use crate::resources::StepGuard;
use crate::run::{ProvisionReport, ProvisionRun};
use crate::state_machine::RunState;

use super::phase::PhaseContext;

pub const VALIDATE_CONFIG_STEP: &str = "validate-config";

/// Drives a cluster through the phases of a [`PhaseRegistry`].
///
/// Phases run strictly one after another. Each one is raced against the
/// run's cancellation signal and its own deadline, and is reported through
/// the [`StepReporter`] as exactly one begin followed by one completion or
/// failure. Nothing is retried here; phases own their polling.
pub struct Provisioner {
    registry: Arc<PhaseRegistry>,
    cluster: Arc<dyn ClusterClient>,
    reporter: Arc<dyn StepReporter>,
}

impl Provisioner {
    pub fn new(
        registry: Arc<PhaseRegistry>,
        cluster: Arc<dyn ClusterClient>,
        reporter: Arc<dyn StepReporter>,
    ) -> Self {
        Self {
            registry,
            cluster,
            reporter,
        }
    }

    pub fn registry(&self) -> &PhaseRegistry {
        &self.registry
    }

    /// Validate raw inputs as a "Validate Configuration" step, then provision.
    pub async fn provision(
        &self,
        ctx: &RunContext,
        inputs: &ProvisionInputs,
        catalog: &Catalog,
    ) -> Result<ProvisionReport> {
        let step = Step::new(VALIDATE_CONFIG_STEP, "Validate Configuration", 1);
        let guard = StepGuard::begin(self.reporter.as_ref(), &step);

        match ConfigGate::new(&self.registry, catalog).check(inputs) {
            Ok((config, catalog_apps)) => {
                guard.complete();
                self.provision_management_cluster(ctx, &config, &catalog_apps)
                    .await
            }
            Err(e) => {
                error!(run_id = %ctx.run_id(), error = %e, "Configuration rejected");
                guard.fail(&e);
                self.reporter
                    .finish_run(&RunOutcome::Failed { phase: None });
                Err(e.into())
            }
        }
    }

    pub async fn provision_management_cluster(
        &self,
        ctx: &RunContext,
        config: &ProvisionConfig,
        catalog_apps: &[CatalogApp],
    ) -> Result<ProvisionReport> {
        let halt_index = match config.halt_phase.as_deref() {
            Some(selector) => match self.registry.position(selector) {
                Some(index) => Some(index),
                None => {
                    let e = ValidationError::UnknownHaltPhase {
                        name: selector.to_string(),
                        known: self.registry.selectors(),
                    };
                    error!(run_id = %ctx.run_id(), error = %e, "Configuration rejected");
                    self.reporter
                        .finish_run(&RunOutcome::Failed { phase: None });
                    return Err(e.into());
                }
            },
            None => None,
        };

        let mut run = ProvisionRun::new(ctx.run_id());
        info!(
            run_id = %run.id(),
            cluster = %config.cluster_name,
            phases = self.registry.len(),
            halt_phase = ?config.halt_phase,
            "Starting provisioning run"
        );

        let phase_ctx = PhaseContext {
            config,
            catalog_apps,
            cluster: self.cluster.as_ref(),
            cancel: ctx.cancel().clone(),
        };

        for (index, phase) in self.registry.iter().enumerate() {
            run.transition(RunState::Running(index))?;
            let name = phase.name().to_string();

            if ctx.cancel().is_cancelled() {
                return self.cancelled(run, index, name);
            }

            let deadline = ctx.phase_timeout().unwrap_or_else(|| phase.timeout());
            let guard = StepGuard::begin(self.reporter.as_ref(), &Step::for_phase(phase));
            let started = Instant::now();
            info!(run_id = %run.id(), phase = %name, index, "Phase started");

            let outcome = tokio::select! {
                biased;
                _ = ctx.cancel().cancelled() => Err(PhaseError::Cancelled),
                result = tokio::time::timeout(deadline, phase.run(&phase_ctx)) => {
                    result.unwrap_or(Err(PhaseError::Timeout(deadline)))
                }
            };

            match outcome {
                Ok(()) => {
                    guard.complete();
                    run.record_completed(&name, started.elapsed());
                    info!(
                        run_id = %run.id(),
                        phase = %name,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Phase completed"
                    );
                }
                Err(PhaseError::Cancelled) => {
                    guard.fail(&PhaseError::Cancelled);
                    return self.cancelled(run, index, name);
                }
                Err(e) => {
                    error!(run_id = %run.id(), phase = %name, error = %e, "Phase failed");
                    guard.fail(&e);
                    run.transition(RunState::Failed(index))?;
                    run.record_error(e.to_string());
                    self.reporter.finish_run(&RunOutcome::Failed {
                        phase: Some(name.clone()),
                    });
                    return Err(ProvisionError::PhaseFailed {
                        phase: name,
                        source: e,
                    });
                }
            }

            if halt_index == Some(index) {
                run.transition(RunState::HaltedAtCheckpoint(index))?;
                run.halt_at(&name);
                info!(
                    run_id = %run.id(),
                    phase = %name,
                    "Halting at checkpoint as requested"
                );
                self.reporter
                    .finish_run(&RunOutcome::Halted { phase: name });
                return Ok(run.into_report());
            }
        }

        run.transition(RunState::Completed)?;
        info!(
            run_id = %run.id(),
            elapsed_ms = run.elapsed().as_millis() as u64,
            "Provisioning run completed"
        );
        self.reporter.finish_run(&RunOutcome::Completed);
        Ok(run.into_report())
    }

    fn cancelled(
        &self,
        mut run: ProvisionRun,
        index: usize,
        phase: String,
    ) -> Result<ProvisionReport> {
        warn!(run_id = %run.id(), phase = %phase, "Provisioning cancelled");
        run.transition(RunState::Cancelled(index))?;
        run.record_error("cancelled");
        self.reporter.finish_run(&RunOutcome::Cancelled {
            phase: Some(phase.clone()),
        });
        Err(ProvisionError::Cancelled { phase: Some(phase) })
    }
}

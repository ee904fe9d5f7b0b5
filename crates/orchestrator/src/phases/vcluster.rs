use std::time::Duration;

use async_trait::async_trait;
use cluster::WaitCondition;
use futures::future::try_join_all;
use tracing::info;

use crate::core::{Phase, PhaseContext};
use crate::error::PhaseResult;
use crate::manifests;

/// Creates the workload environments as vClusters through ArgoCD.
pub struct ProvisionVclustersPhase;

#[async_trait]
impl Phase for ProvisionVclustersPhase {
    fn name(&self) -> &str {
        "provision-vclusters"
    }

    fn checkpoint(&self) -> Option<&str> {
        Some("vcluster")
    }

    fn title(&self) -> &str {
        "Provision vClusters"
    }

    fn estimated_minutes(&self) -> u32 {
        8
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(25 * 60)
    }

    async fn run(&self, ctx: &PhaseContext<'_>) -> PhaseResult {
        let config = ctx.config;
        if config.vclusters.is_empty() {
            info!("No vClusters requested");
            return Ok(());
        }

        for environment in &config.vclusters {
            ctx.check_cancelled()?;
            ctx.cluster
                .apply_manifest(&manifests::vcluster_application(config, environment))
                .await?;
        }

        let refs: Vec<_> = config
            .vclusters
            .iter()
            .map(|env| manifests::application_ref(&manifests::vcluster_application_name(env)))
            .collect();
        let healthy = WaitCondition::HealthySynced;
        try_join_all(refs.iter().map(|app| {
            ctx.cluster
                .wait_for_condition(app, &healthy, Duration::from_secs(20 * 60))
        }))
        .await?;

        info!(vclusters = %config.vclusters.join(","), "vClusters healthy");
        Ok(())
    }
}

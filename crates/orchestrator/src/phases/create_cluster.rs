use std::time::Duration;

use async_trait::async_trait;
use cluster::WaitCondition;
use tracing::info;

use crate::core::{Phase, PhaseContext};
use crate::error::PhaseResult;
use crate::manifests;

/// Lays down the platform namespace, its settings and the LB address pool.
pub struct CreateClusterPhase;

#[async_trait]
impl Phase for CreateClusterPhase {
    fn name(&self) -> &str {
        "create-cluster"
    }

    fn title(&self) -> &str {
        "Create Management Cluster"
    }

    fn estimated_minutes(&self) -> u32 {
        3
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(10 * 60)
    }

    async fn run(&self, ctx: &PhaseContext<'_>) -> PhaseResult {
        let config = ctx.config;

        ctx.cluster
            .apply_manifest(&manifests::namespace(manifests::PLATFORM_NAMESPACE))
            .await?;
        ctx.cluster
            .apply_manifest(&manifests::platform_config_map(config))
            .await?;
        ctx.cluster.apply_manifest(&manifests::ip_pool(config)).await?;

        ctx.cluster
            .wait_for_condition(
                &manifests::platform_config_map_ref(),
                &WaitCondition::Exists,
                Duration::from_secs(60),
            )
            .await?;

        info!(
            cluster = %config.cluster_name,
            ip_pool = %manifests::ip_pool_name(config),
            lb_ip_range = %config.lb_ip_range,
            "Management cluster scaffolding applied"
        );
        Ok(())
    }
}

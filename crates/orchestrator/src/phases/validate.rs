use std::time::Duration;

use async_trait::async_trait;
use cluster::{ResourceRef, ResourceStatus};
use tracing::info;

use crate::core::{Phase, PhaseContext};
use crate::error::{PhaseError, PhaseResult};

/// CRDs that only exist on a Harvester cluster
const HARVESTER_CRDS: &[&str] = &[
    "settings.harvesterhci.io",
    "ippools.loadbalancer.harvesterhci.io",
];

/// Confirms the kubeconfig reaches a Harvester cluster.
pub struct ValidatePhase;

#[async_trait]
impl Phase for ValidatePhase {
    fn name(&self) -> &str {
        "validate"
    }

    fn title(&self) -> &str {
        "Validate Harvester Cluster"
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(2 * 60)
    }

    async fn run(&self, ctx: &PhaseContext<'_>) -> PhaseResult {
        let kube_system = ResourceRef::cluster_scoped("namespace", "kube-system");
        if ctx.cluster.get_resource_status(&kube_system).await? == ResourceStatus::Missing {
            return Err(PhaseError::precondition(format!(
                "cluster behind {} has no kube-system namespace",
                ctx.config.kubeconfig_path.display()
            )));
        }

        for crd in HARVESTER_CRDS {
            let resource = ResourceRef::cluster_scoped("customresourcedefinitions", *crd);
            if !ctx.cluster.get_resource_status(&resource).await?.is_present() {
                return Err(PhaseError::precondition(format!(
                    "{} is not installed; is this a Harvester cluster?",
                    crd
                )));
            }
        }

        info!(kubeconfig = %ctx.config.kubeconfig_path.display(), "Harvester cluster reachable");
        Ok(())
    }
}

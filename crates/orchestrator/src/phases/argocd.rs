use std::time::Duration;

use async_trait::async_trait;
use cluster::{Manifest, ResourceRef, WaitCondition};
use tracing::info;

use crate::core::{Phase, PhaseContext};
use crate::error::PhaseResult;
use crate::manifests::{self, AppSource, ARGOCD_INSTALL_URL, ARGOCD_NAMESPACE};

/// Installs ArgoCD and hands the cluster registry to it.
pub struct InstallArgocdPhase;

#[async_trait]
impl Phase for InstallArgocdPhase {
    fn name(&self) -> &str {
        "install-argocd"
    }

    fn checkpoint(&self) -> Option<&str> {
        Some("argocd")
    }

    fn title(&self) -> &str {
        "Install ArgoCD"
    }

    fn estimated_minutes(&self) -> u32 {
        5
    }

    async fn run(&self, ctx: &PhaseContext<'_>) -> PhaseResult {
        let config = ctx.config;

        ctx.cluster
            .apply_manifest(&manifests::namespace(ARGOCD_NAMESPACE))
            .await?;
        ctx.cluster
            .apply_manifest(
                &Manifest::remote("argocd install", ARGOCD_INSTALL_URL)
                    .in_namespace(ARGOCD_NAMESPACE),
            )
            .await?;

        ctx.cluster
            .wait_for_condition(
                &ResourceRef::namespaced("deployment", ARGOCD_NAMESPACE, "argocd-server"),
                &WaitCondition::available(),
                Duration::from_secs(10 * 60),
            )
            .await?;
        ctx.check_cancelled()?;

        let registry_app = format!("{}-registry", config.cluster_name);
        ctx.cluster
            .apply_manifest(&manifests::application(
                config,
                &registry_app,
                &AppSource::gitops(manifests::cluster_path(config, "")),
                ARGOCD_NAMESPACE,
            ))
            .await?;
        ctx.cluster
            .wait_for_condition(
                &manifests::application_ref(&registry_app),
                &WaitCondition::Exists,
                Duration::from_secs(60),
            )
            .await?;

        info!(
            repo = %config.gitops.repo_url(),
            application = %registry_app,
            "ArgoCD installed and registry application applied"
        );
        Ok(())
    }
}

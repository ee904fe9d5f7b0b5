use std::time::Duration;

use async_trait::async_trait;
use cluster::WaitCondition;
use futures::future::try_join_all;
use tracing::info;

use crate::core::{Phase, PhaseContext};
use crate::error::PhaseResult;
use crate::manifests;

/// Installs the requested catalog apps, one ArgoCD Application each.
pub struct InstallCatalogAppsPhase;

#[async_trait]
impl Phase for InstallCatalogAppsPhase {
    fn name(&self) -> &str {
        "install-catalog-apps"
    }

    fn title(&self) -> &str {
        "Install Catalog Apps"
    }

    fn estimated_minutes(&self) -> u32 {
        5
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(20 * 60)
    }

    async fn run(&self, ctx: &PhaseContext<'_>) -> PhaseResult {
        if ctx.catalog_apps.is_empty() {
            info!("No catalog apps requested");
            return Ok(());
        }

        for app in ctx.catalog_apps {
            ctx.check_cancelled()?;
            ctx.cluster
                .apply_manifest(&manifests::catalog_application(ctx.config, app))
                .await?;
        }

        // Apps sync independently, so wait on all of them together
        let refs: Vec<_> = ctx
            .catalog_apps
            .iter()
            .map(|app| manifests::application_ref(&app.name))
            .collect();
        let healthy = WaitCondition::HealthySynced;
        try_join_all(refs.iter().map(|app| {
            ctx.cluster
                .wait_for_condition(app, &healthy, Duration::from_secs(15 * 60))
        }))
        .await?;

        info!(apps = ctx.catalog_apps.len(), "Catalog apps healthy");
        Ok(())
    }
}

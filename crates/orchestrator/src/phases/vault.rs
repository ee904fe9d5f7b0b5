use std::time::Duration;

use async_trait::async_trait;
use cluster::WaitCondition;
use tracing::info;

use crate::core::{Phase, PhaseContext};
use crate::error::PhaseResult;
use crate::manifests::{self, AppSource};

pub const VAULT_APPLICATION: &str = "vault";

pub struct InstallVaultPhase;

#[async_trait]
impl Phase for InstallVaultPhase {
    fn name(&self) -> &str {
        "install-vault"
    }

    fn checkpoint(&self) -> Option<&str> {
        Some("vault")
    }

    fn title(&self) -> &str {
        "Install Vault"
    }

    fn estimated_minutes(&self) -> u32 {
        4
    }

    async fn run(&self, ctx: &PhaseContext<'_>) -> PhaseResult {
        let config = ctx.config;

        ctx.cluster
            .apply_manifest(&manifests::application(
                config,
                VAULT_APPLICATION,
                &AppSource::gitops(manifests::cluster_path(config, "components/vault")),
                "vault",
            ))
            .await?;

        ctx.cluster
            .wait_for_condition(
                &manifests::application_ref(VAULT_APPLICATION),
                &WaitCondition::HealthySynced,
                Duration::from_secs(12 * 60),
            )
            .await?;

        info!("Vault application healthy");
        Ok(())
    }
}

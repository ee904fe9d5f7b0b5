//! The management cluster phases, in execution order.

mod argocd;
mod catalog;
mod create_cluster;
mod ingress;
mod validate;
mod vault;
mod vcluster;

use std::sync::Arc;

use edge::{DnsProvider, IngressDevice};

use crate::registry::{PhaseRegistry, RegistryError};

pub use argocd::InstallArgocdPhase;
pub use catalog::InstallCatalogAppsPhase;
pub use create_cluster::CreateClusterPhase;
pub use ingress::ConfigureIngressPhase;
pub use validate::ValidatePhase;
pub use vault::InstallVaultPhase;
pub use vcluster::ProvisionVclustersPhase;

/// External services the edge-facing phases talk to.
#[derive(Clone, Default)]
pub struct PhaseServices {
    pub dns: Option<Arc<dyn DnsProvider>>,
    pub ingress_device: Option<Arc<dyn IngressDevice>>,
}

/// The full management cluster sequence.
pub fn management_registry(services: PhaseServices) -> Result<PhaseRegistry, RegistryError> {
    PhaseRegistry::builder()
        .phase(ValidatePhase)
        .phase(CreateClusterPhase)
        .phase(InstallArgocdPhase)
        .phase(ConfigureIngressPhase::new(services.dns, services.ingress_device))
        .phase(ProvisionVclustersPhase)
        .phase(InstallVaultPhase)
        .phase(InstallCatalogAppsPhase)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_management_registry_order() {
        let registry = management_registry(PhaseServices::default()).unwrap();
        assert_eq!(
            registry.names(),
            vec![
                "validate",
                "create-cluster",
                "install-argocd",
                "configure-ingress",
                "provision-vclusters",
                "install-vault",
                "install-catalog-apps"
            ]
        );
        assert_eq!(
            registry.checkpoints(),
            vec!["argocd", "ingress", "vcluster", "vault"]
        );
    }

    #[test]
    fn test_every_phase_has_a_title_and_deadline() {
        let registry = management_registry(PhaseServices::default()).unwrap();
        for phase in registry.iter() {
            assert!(!phase.title().is_empty(), "{} has no title", phase.name());
            assert!(phase.timeout().as_secs() > 0);
            assert!(phase.estimated_minutes() > 0);
        }
    }
}

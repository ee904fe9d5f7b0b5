//! Configuration validation gate.
//!
//! Turns raw [`ProvisionInputs`] into a [`ProvisionConfig`] plus the resolved
//! catalog apps. Nothing here touches the cluster or any remote service.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::OnceLock;

use platform_core::{
    is_dns1123_label, Catalog, CatalogApp, ClusterType, DnsProviderKind, GitProtocol,
    GitProvider, GitopsSettings, Ipv4Cidr, IstioSettings, ProvisionConfig, ProvisionInputs,
    UnifiSettings, ValidationError, CLOUD_PROVIDER,
};
use regex::Regex;
use tracing::debug;

use crate::registry::PhaseRegistry;

type GateResult<T> = std::result::Result<T, ValidationError>;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
    })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub struct ConfigGate<'a> {
    registry: &'a PhaseRegistry,
    catalog: &'a Catalog,
}

impl<'a> ConfigGate<'a> {
    pub fn new(registry: &'a PhaseRegistry, catalog: &'a Catalog) -> Self {
        Self { registry, catalog }
    }

    pub fn check(
        &self,
        inputs: &ProvisionInputs,
    ) -> GateResult<(ProvisionConfig, Vec<CatalogApp>)> {
        let provider = GitProvider::validate(&inputs.git_provider)?;
        let protocol = match non_empty(&inputs.git_protocol) {
            Some(protocol) => GitProtocol::validate(protocol)?,
            None => GitProtocol::default(),
        };

        if !is_dns1123_label(&inputs.cluster_name) {
            return Err(ValidationError::invalid(
                "cluster-name",
                format!("'{}' is not a DNS-1123 label", inputs.cluster_name),
            ));
        }
        let cluster_type = ClusterType::validate(&inputs.cluster_type)?;
        let dns_provider = DnsProviderKind::validate(&inputs.dns_provider)?;

        let alerts_email = inputs.alerts_email.trim();
        if alerts_email.is_empty() {
            return Err(ValidationError::Missing("alerts-email"));
        }
        if !email_regex().is_match(alerts_email) {
            return Err(ValidationError::invalid(
                "alerts-email",
                format!("'{}' is not an email address", alerts_email),
            ));
        }

        let domain_name = self.check_domain(&inputs.domain_name)?;
        let owner = self.check_owner(provider, inputs)?;

        if inputs.kubeconfig_path.trim().is_empty() {
            return Err(ValidationError::Missing("kubeconfig-path"));
        }
        let lb_ip_range: Ipv4Cidr = inputs.lb_ip_range.trim().parse()?;
        let vclusters = self.check_vclusters(&inputs.vclusters)?;
        let unifi = self.check_unifi(inputs)?;

        let catalog_apps = self.catalog.resolve(&inputs.install_catalog_apps)?;
        let halt_phase = self.check_halt_phase(&inputs.stop_after)?;

        let config = ProvisionConfig {
            cluster_name: inputs.cluster_name.clone(),
            cluster_type,
            cloud_provider: CLOUD_PROVIDER.to_string(),
            kubeconfig_path: PathBuf::from(inputs.kubeconfig_path.trim()),
            alerts_email: alerts_email.to_string(),
            dns_provider,
            domain_name,
            gitops: GitopsSettings {
                provider,
                protocol,
                owner,
                repo_name: inputs.gitops_repo.clone(),
                template_url: inputs.gitops_template_url.clone(),
                template_branch: non_empty(&inputs.gitops_template_branch).map(str::to_string),
            },
            install_kubefirst_pro: inputs.install_kubefirst_pro,
            lb_ip_range,
            vclusters,
            istio: IstioSettings {
                enabled: inputs.install_istio,
                version: inputs.istio_version.clone(),
            },
            install_kgateway: inputs.install_kgateway,
            unifi,
            halt_phase,
            ci: inputs.ci,
        };

        debug!(
            cluster = %config.cluster_name,
            git_provider = %provider,
            catalog_apps = catalog_apps.len(),
            halt_phase = ?config.halt_phase,
            "Configuration validated"
        );

        Ok((config, catalog_apps))
    }

    fn check_domain(&self, domain: &str) -> GateResult<String> {
        let domain = domain.trim().trim_end_matches('.').to_ascii_lowercase();
        if domain.is_empty() {
            return Err(ValidationError::Missing("domain-name"));
        }
        if domain.len() > 253 || !domain.split('.').all(is_dns1123_label) {
            return Err(ValidationError::invalid(
                "domain-name",
                format!("'{}' is not a valid DNS name", domain),
            ));
        }
        Ok(domain)
    }

    fn check_owner(&self, provider: GitProvider, inputs: &ProvisionInputs) -> GateResult<String> {
        let owner = match provider {
            GitProvider::Github => non_empty(&inputs.github_org),
            GitProvider::Gitlab => non_empty(&inputs.gitlab_group),
        };
        owner
            .map(str::to_string)
            .ok_or(ValidationError::Missing(provider.owner_flag()))
    }

    fn check_vclusters(&self, names: &[String]) -> GateResult<Vec<String>> {
        let mut seen = HashSet::new();
        let mut vclusters = Vec::with_capacity(names.len());
        for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
            if !is_dns1123_label(name) {
                return Err(ValidationError::invalid(
                    "vclusters",
                    format!("'{}' is not a DNS-1123 label", name),
                ));
            }
            if !seen.insert(name) {
                return Err(ValidationError::invalid(
                    "vclusters",
                    format!("'{}' is listed more than once", name),
                ));
            }
            vclusters.push(name.to_string());
        }
        Ok(vclusters)
    }

    fn check_unifi(&self, inputs: &ProvisionInputs) -> GateResult<Option<UnifiSettings>> {
        let Some(host) = non_empty(&inputs.unifi_host) else {
            return Ok(None);
        };
        if non_empty(&inputs.unifi_password).is_none() {
            return Err(ValidationError::Missing("unifi-password"));
        }
        Ok(Some(UnifiSettings {
            host: host.to_string(),
            user: inputs.unifi_user.clone(),
        }))
    }

    fn check_halt_phase(&self, stop_after: &Option<String>) -> GateResult<Option<String>> {
        match non_empty(stop_after) {
            None => Ok(None),
            Some(selector) if self.registry.contains(selector) => Ok(Some(selector.to_string())),
            Some(selector) => Err(ValidationError::UnknownHaltPhase {
                name: selector.to_string(),
                known: self.registry.selectors(),
            }),
        }
    }
}

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::git::{GitProtocol, GitProvider};
use super::network::Ipv4Cidr;
use crate::error::{Result, ValidationError};

pub const CLOUD_PROVIDER: &str = "harvester";

/// Values used when neither a flag nor the settings file provides one.
pub mod defaults {
    pub const KUBECONFIG_PATH: &str = "$HOME/.kube/harvester.yaml";
    pub const CLUSTER_NAME: &str = "kubefirst";
    pub const CLUSTER_TYPE: &str = "mgmt";
    pub const DNS_PROVIDER: &str = "cloudflare";
    pub const GIT_PROVIDER: &str = "github";
    pub const GIT_PROTOCOL: &str = "ssh";
    pub const GITOPS_TEMPLATE_URL: &str = "https://github.com/konstructio/gitops-template.git";
    pub const GITOPS_REPO: &str = "harvester-argo";
    pub const LB_IP_RANGE: &str = "10.0.12.0/24";
    pub const VCLUSTERS: &[&str] = &["dev", "test", "prod"];
    pub const ISTIO_VERSION: &str = "latest";
    pub const UNIFI_USER: &str = "admin";
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClusterType {
    #[default]
    Mgmt,
    Workload,
}

impl ClusterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mgmt => "mgmt",
            Self::Workload => "workload",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mgmt" => Some(Self::Mgmt),
            "workload" => Some(Self::Workload),
            _ => None,
        }
    }

    pub fn validate(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| ValidationError::UnsupportedClusterType(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DnsProviderKind {
    #[default]
    Cloudflare,
}

impl DnsProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cloudflare => "cloudflare",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cloudflare" => Some(Self::Cloudflare),
            _ => None,
        }
    }

    pub fn validate(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| ValidationError::UnsupportedDnsProvider(s.to_string()))
    }
}

/// Where the GitOps repository lives and which template seeds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitopsSettings {
    pub provider: GitProvider,
    pub protocol: GitProtocol,
    /// GitHub organization or GitLab group
    pub owner: String,
    pub repo_name: String,
    pub template_url: String,
    pub template_branch: Option<String>,
}

impl GitopsSettings {
    pub fn repo_url(&self) -> String {
        self.provider.repo_url(self.protocol, &self.owner, &self.repo_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IstioSettings {
    pub enabled: bool,
    pub version: String,
}

/// UniFi controller used for WAN port forwarding. The password is kept out
/// of the configuration and handed straight to the controller client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifiSettings {
    pub host: String,
    pub user: String,
}

/// Fully validated provisioning configuration.
///
/// Produced once by the configuration gate and shared read-only with every
/// phase of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionConfig {
    pub cluster_name: String,
    pub cluster_type: ClusterType,
    pub cloud_provider: String,
    pub kubeconfig_path: PathBuf,
    pub alerts_email: String,
    pub dns_provider: DnsProviderKind,
    pub domain_name: String,
    pub gitops: GitopsSettings,
    pub install_kubefirst_pro: bool,
    pub lb_ip_range: Ipv4Cidr,
    pub vclusters: Vec<String>,
    pub istio: IstioSettings,
    pub install_kgateway: bool,
    pub unifi: Option<UnifiSettings>,
    /// Phase name or checkpoint after which the run stops on purpose
    pub halt_phase: Option<String>,
    pub ci: bool,
}

/// Raw provisioning inputs as collected from flags, the settings file and
/// the environment. Nothing here has been validated yet.
#[derive(Clone, PartialEq, Eq)]
pub struct ProvisionInputs {
    pub kubeconfig_path: String,
    pub alerts_email: String,
    pub ci: bool,
    pub cluster_name: String,
    pub cluster_type: String,
    pub dns_provider: String,
    pub domain_name: String,
    pub git_provider: String,
    pub git_protocol: Option<String>,
    pub github_org: Option<String>,
    pub gitlab_group: Option<String>,
    pub gitops_template_url: String,
    pub gitops_template_branch: Option<String>,
    pub gitops_repo: String,
    pub install_catalog_apps: String,
    pub install_kubefirst_pro: bool,
    pub lb_ip_range: String,
    pub vclusters: Vec<String>,
    pub install_istio: bool,
    pub istio_version: String,
    pub install_kgateway: bool,
    pub unifi_host: Option<String>,
    pub unifi_user: String,
    pub unifi_password: Option<String>,
    pub stop_after: Option<String>,
}

impl Default for ProvisionInputs {
    fn default() -> Self {
        Self {
            kubeconfig_path: defaults::KUBECONFIG_PATH.to_string(),
            alerts_email: String::new(),
            ci: false,
            cluster_name: defaults::CLUSTER_NAME.to_string(),
            cluster_type: defaults::CLUSTER_TYPE.to_string(),
            dns_provider: defaults::DNS_PROVIDER.to_string(),
            domain_name: String::new(),
            git_provider: defaults::GIT_PROVIDER.to_string(),
            git_protocol: None,
            github_org: None,
            gitlab_group: None,
            gitops_template_url: defaults::GITOPS_TEMPLATE_URL.to_string(),
            gitops_template_branch: None,
            gitops_repo: defaults::GITOPS_REPO.to_string(),
            install_catalog_apps: String::new(),
            install_kubefirst_pro: true,
            lb_ip_range: defaults::LB_IP_RANGE.to_string(),
            vclusters: defaults::VCLUSTERS.iter().map(|v| v.to_string()).collect(),
            install_istio: true,
            istio_version: defaults::ISTIO_VERSION.to_string(),
            install_kgateway: true,
            unifi_host: None,
            unifi_user: defaults::UNIFI_USER.to_string(),
            unifi_password: None,
            stop_after: None,
        }
    }
}

impl std::fmt::Debug for ProvisionInputs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisionInputs")
            .field("kubeconfig_path", &self.kubeconfig_path)
            .field("alerts_email", &self.alerts_email)
            .field("ci", &self.ci)
            .field("cluster_name", &self.cluster_name)
            .field("cluster_type", &self.cluster_type)
            .field("dns_provider", &self.dns_provider)
            .field("domain_name", &self.domain_name)
            .field("git_provider", &self.git_provider)
            .field("git_protocol", &self.git_protocol)
            .field("github_org", &self.github_org)
            .field("gitlab_group", &self.gitlab_group)
            .field("gitops_template_url", &self.gitops_template_url)
            .field("gitops_template_branch", &self.gitops_template_branch)
            .field("gitops_repo", &self.gitops_repo)
            .field("install_catalog_apps", &self.install_catalog_apps)
            .field("install_kubefirst_pro", &self.install_kubefirst_pro)
            .field("lb_ip_range", &self.lb_ip_range)
            .field("vclusters", &self.vclusters)
            .field("install_istio", &self.install_istio)
            .field("istio_version", &self.istio_version)
            .field("install_kgateway", &self.install_kgateway)
            .field("unifi_host", &self.unifi_host)
            .field("unifi_user", &self.unifi_user)
            .field(
                "unifi_password",
                &self.unifi_password.as_ref().map(|_| "<redacted>"),
            )
            .field("stop_after", &self.stop_after)
            .finish()
    }
}

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "kubefirst-harvester")]
#[command(about = "kubefirst Harvester installation", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the kubefirst platform on Harvester
    Create(Box<CreateArgs>),
    /// Destroy the kubefirst platform on Harvester
    Destroy,
    /// Retrieve root credentials for the Harvester cluster
    RootCredentials,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Flags of `create`.
///
/// Every setting is optional here so the resolver can tell an explicit flag
/// apart from one that should fall back to the settings file.
#[derive(Args, Debug, Clone, Default)]
pub struct CreateArgs {
    /// Settings file (defaults to ~/.kubefirst/harvester.toml when present)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// TOML file replacing the built-in application catalog
    #[arg(long, value_name = "PATH")]
    pub catalog_file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Path to the Harvester kubeconfig file
    #[arg(long, env = "HARVESTER_KUBECONFIG")]
    pub kubeconfig_path: Option<String>,

    /// Email address for Let's Encrypt certificate notifications (required)
    #[arg(long)]
    pub alerts_email: Option<String>,

    /// Disable interactive features
    #[arg(long)]
    pub ci: bool,

    #[arg(long, hide = true)]
    pub cloud_region: Option<String>,

    #[arg(long, hide = true)]
    pub node_type: Option<String>,

    #[arg(long, hide = true)]
    pub node_count: Option<String>,

    /// Name of the cluster to create
    #[arg(long)]
    pub cluster_name: Option<String>,

    /// Type of cluster to create (mgmt|workload)
    #[arg(long)]
    pub cluster_type: Option<String>,

    /// DNS provider, one of: cloudflare
    #[arg(long)]
    pub dns_provider: Option<String>,

    /// Domain name for the platform
    #[arg(long)]
    pub domain_name: Option<String>,

    /// Git provider, one of: github, gitlab
    #[arg(long)]
    pub git_provider: Option<String>,

    /// Git protocol, one of: https, ssh
    #[arg(long)]
    pub git_protocol: Option<String>,

    /// GitHub organization for the new GitOps repository
    #[arg(long)]
    pub github_org: Option<String>,

    /// GitLab group for the new GitOps project
    #[arg(long)]
    pub gitlab_group: Option<String>,

    #[arg(long)]
    pub gitops_template_url: Option<String>,

    #[arg(long)]
    pub gitops_template_branch: Option<String>,

    /// Name of the GitOps repository
    #[arg(long)]
    pub gitops_repo: Option<String>,

    /// Comma separated catalog apps to install after provisioning
    #[arg(long)]
    pub install_catalog_apps: Option<String>,

    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub install_kubefirst_pro: Option<bool>,

    /// IP range for the Harvester load balancer pool
    #[arg(long)]
    pub lb_ip_range: Option<String>,

    /// vCluster environments to create
    #[arg(long, value_delimiter = ',')]
    pub vclusters: Option<Vec<String>>,

    /// Install Istio in ambient mode
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub install_istio: Option<bool>,

    #[arg(long)]
    pub istio_version: Option<String>,

    /// Install the Kubernetes Gateway API and Kgateway
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub install_kgateway: Option<bool>,

    /// UniFi controller used for WAN port forwarding (e.g. 192.168.1.1)
    #[arg(long)]
    pub unifi_host: Option<String>,

    #[arg(long)]
    pub unifi_user: Option<String>,

    #[arg(long, env = "UNIFI_PASSWORD", hide_env_values = true)]
    pub unifi_password: Option<String>,

    /// Halt after phase: argocd|ingress|vcluster|vault, or any phase name
    #[arg(long)]
    pub stop_after: Option<String>,
}

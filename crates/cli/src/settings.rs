//! Settings file and input resolution.
//!
//! Inputs are resolved with the precedence flag > settings file > built-in
//! default. Resolution is a pure function of the parsed flags and the parsed
//! file so it can be tested without a process environment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use platform_core::{Catalog, ProvisionInputs};
use serde::{Deserialize, Serialize};

use crate::args::CreateArgs;

const KUBEFIRST_DIR: &str = ".kubefirst";
const SETTINGS_FILE: &str = "harvester.toml";

/// Contents of `~/.kubefirst/harvester.toml`. Keys mirror the flag names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileSettings {
    pub kubeconfig_path: Option<String>,
    pub alerts_email: Option<String>,
    pub ci: Option<bool>,
    pub cluster_name: Option<String>,
    pub cluster_type: Option<String>,
    pub dns_provider: Option<String>,
    pub domain_name: Option<String>,
    pub git_provider: Option<String>,
    pub git_protocol: Option<String>,
    pub github_org: Option<String>,
    pub gitlab_group: Option<String>,
    pub gitops_template_url: Option<String>,
    pub gitops_template_branch: Option<String>,
    pub gitops_repo: Option<String>,
    pub install_catalog_apps: Option<String>,
    pub install_kubefirst_pro: Option<bool>,
    pub lb_ip_range: Option<String>,
    pub vclusters: Option<Vec<String>>,
    pub install_istio: Option<bool>,
    pub istio_version: Option<String>,
    pub install_kgateway: Option<bool>,
    pub unifi_host: Option<String>,
    pub unifi_user: Option<String>,
    pub stop_after: Option<String>,
    pub catalog_file: Option<PathBuf>,
}

impl FileSettings {
    /// Load settings from `path`, or from the default location if none is
    /// given. An explicit path must exist; the default one is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match default_settings_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            if required {
                anyhow::bail!("settings file {} does not exist", path.display());
            }
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Loaded settings file");
        Ok(settings)
    }
}

pub fn kubefirst_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(KUBEFIRST_DIR))
}

pub fn default_settings_path() -> Option<PathBuf> {
    kubefirst_dir().map(|dir| dir.join(SETTINGS_FILE))
}

/// Merge flags over file settings over defaults.
pub fn resolve_inputs(flags: &CreateArgs, file: &FileSettings) -> ProvisionInputs {
    let defaults = ProvisionInputs::default();

    fn pick<T: Clone>(flag: &Option<T>, file: &Option<T>, default: T) -> T {
        flag.clone().or_else(|| file.clone()).unwrap_or(default)
    }

    fn pick_opt<T: Clone>(flag: &Option<T>, file: &Option<T>) -> Option<T> {
        flag.clone().or_else(|| file.clone())
    }

    ProvisionInputs {
        kubeconfig_path: pick(
            &flags.kubeconfig_path,
            &file.kubeconfig_path,
            defaults.kubeconfig_path,
        ),
        alerts_email: pick(&flags.alerts_email, &file.alerts_email, defaults.alerts_email),
        ci: flags.ci || file.ci.unwrap_or(defaults.ci),
        cluster_name: pick(&flags.cluster_name, &file.cluster_name, defaults.cluster_name),
        cluster_type: pick(&flags.cluster_type, &file.cluster_type, defaults.cluster_type),
        dns_provider: pick(&flags.dns_provider, &file.dns_provider, defaults.dns_provider),
        domain_name: pick(&flags.domain_name, &file.domain_name, defaults.domain_name),
        git_provider: pick(&flags.git_provider, &file.git_provider, defaults.git_provider),
        git_protocol: pick_opt(&flags.git_protocol, &file.git_protocol),
        github_org: pick_opt(&flags.github_org, &file.github_org),
        gitlab_group: pick_opt(&flags.gitlab_group, &file.gitlab_group),
        gitops_template_url: pick(
            &flags.gitops_template_url,
            &file.gitops_template_url,
            defaults.gitops_template_url,
        ),
        gitops_template_branch: pick_opt(
            &flags.gitops_template_branch,
            &file.gitops_template_branch,
        ),
        gitops_repo: pick(&flags.gitops_repo, &file.gitops_repo, defaults.gitops_repo),
        install_catalog_apps: pick(
            &flags.install_catalog_apps,
            &file.install_catalog_apps,
            defaults.install_catalog_apps,
        ),
        install_kubefirst_pro: pick(
            &flags.install_kubefirst_pro,
            &file.install_kubefirst_pro,
            defaults.install_kubefirst_pro,
        ),
        lb_ip_range: pick(&flags.lb_ip_range, &file.lb_ip_range, defaults.lb_ip_range),
        vclusters: pick(&flags.vclusters, &file.vclusters, defaults.vclusters),
        install_istio: pick(&flags.install_istio, &file.install_istio, defaults.install_istio),
        istio_version: pick(&flags.istio_version, &file.istio_version, defaults.istio_version),
        install_kgateway: pick(
            &flags.install_kgateway,
            &file.install_kgateway,
            defaults.install_kgateway,
        ),
        unifi_host: pick_opt(&flags.unifi_host, &file.unifi_host),
        unifi_user: pick(&flags.unifi_user, &file.unifi_user, defaults.unifi_user),
        // Never read from the settings file
        unifi_password: flags.unifi_password.clone(),
        stop_after: pick_opt(&flags.stop_after, &file.stop_after),
    }
}

/// Expand a leading `~` or `$HOME` against `home`.
pub fn expand_home(path: &str, home: Option<&Path>) -> String {
    let Some(home) = home else {
        return path.to_string();
    };
    let home = home.display().to_string();

    for prefix in ["$HOME", "${HOME}", "~"] {
        if let Some(rest) = path.strip_prefix(prefix) {
            if rest.is_empty() || rest.starts_with('/') {
                return format!("{}{}", home, rest);
            }
        }
    }
    path.to_string()
}

/// Read a catalog override file: a list of `[[app]]` tables.
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog file {}", path.display()))?;
    let catalog: Catalog = toml::from_str(&content)
        .with_context(|| format!("Failed to parse catalog file {}", path.display()))?;
    if catalog.is_empty() {
        anyhow::bail!("catalog file {} defines no apps", path.display());
    }
    Ok(catalog)
}

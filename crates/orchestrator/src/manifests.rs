//! Kubernetes objects applied by the management phases, rendered as JSON.

use cluster::{Manifest, ResourceRef};
use platform_core::{CatalogApp, ProvisionConfig};
use serde_json::{json, Value};

pub const PLATFORM_NAMESPACE: &str = "kubefirst";
pub const PLATFORM_CONFIG_MAP: &str = "kubefirst-config";
pub const ARGOCD_NAMESPACE: &str = "argocd";
pub const ARGOCD_INSTALL_URL: &str =
    "https://raw.githubusercontent.com/argoproj/argo-cd/stable/manifests/install.yaml";
/// Branch of the generated gitops repository that ArgoCD tracks
pub const GITOPS_REVISION: &str = "main";

pub fn namespace(name: &str) -> Manifest {
    Manifest::inline(
        format!("namespace {}", name),
        json!({
            "apiVersion": "v1",
            "kind": "Namespace",
            "metadata": {
                "name": name,
                "labels": {"app.kubernetes.io/managed-by": "kubefirst"}
            }
        }),
    )
}

/// Platform settings later read by the gitops templates.
pub fn platform_config_map(config: &ProvisionConfig) -> Manifest {
    let gitops = &config.gitops;
    let data = json!({
        "cluster-name": config.cluster_name,
        "cluster-type": config.cluster_type.as_str(),
        "cloud-provider": config.cloud_provider,
        "domain-name": config.domain_name,
        "alerts-email": config.alerts_email,
        "dns-provider": config.dns_provider.as_str(),
        "git-provider": gitops.provider.as_str(),
        "git-protocol": gitops.protocol.as_str(),
        "git-owner": gitops.owner,
        "gitops-repo-url": gitops.repo_url(),
        "gitops-template-url": gitops.template_url,
        "gitops-template-branch": gitops.template_branch.clone().unwrap_or_default(),
        "install-kubefirst-pro": config.install_kubefirst_pro.to_string(),
        "lb-ip-range": config.lb_ip_range.to_string(),
        "vclusters": config.vclusters.join(","),
        "install-istio": config.istio.enabled.to_string(),
        "istio-version": config.istio.version,
        "install-kgateway": config.install_kgateway.to_string(),
    });

    Manifest::inline(
        format!("configmap {}", PLATFORM_CONFIG_MAP),
        json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {"name": PLATFORM_CONFIG_MAP, "namespace": PLATFORM_NAMESPACE},
            "data": data
        }),
    )
}

pub fn platform_config_map_ref() -> ResourceRef {
    ResourceRef::namespaced("configmap", PLATFORM_NAMESPACE, PLATFORM_CONFIG_MAP)
}

pub fn ip_pool_name(config: &ProvisionConfig) -> String {
    format!("{}-lb", config.cluster_name)
}

/// Harvester load balancer pool the gateway Service draws its address from.
pub fn ip_pool(config: &ProvisionConfig) -> Manifest {
    let cidr = &config.lb_ip_range;
    let name = ip_pool_name(config);
    Manifest::inline(
        format!("ippool {}", name),
        json!({
            "apiVersion": "loadbalancer.harvesterhci.io/v1beta1",
            "kind": "IPPool",
            "metadata": {"name": name},
            "spec": {
                "ranges": [{
                    "subnet": cidr.to_string(),
                    "rangeStart": cidr.first_host().to_string(),
                    "rangeEnd": cidr.last_host().to_string(),
                }],
                "selector": {"scope": [{"namespace": "*", "project": "*", "guestCluster": "*"}]}
            }
        }),
    )
}

/// Where an ArgoCD Application takes its manifests from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppSource {
    /// A path in the generated gitops repository, optionally rendered with
    /// Helm values
    Gitops { path: String, values: Option<Value> },
    /// A chart from a Helm repository
    Helm {
        repo_url: String,
        chart: String,
        version: String,
    },
}

impl AppSource {
    pub fn gitops(path: impl Into<String>) -> Self {
        Self::Gitops {
            path: path.into(),
            values: None,
        }
    }
}

pub fn application_ref(name: &str) -> ResourceRef {
    ResourceRef::namespaced("applications.argoproj.io", ARGOCD_NAMESPACE, name)
}

pub fn application(
    config: &ProvisionConfig,
    name: &str,
    source: &AppSource,
    destination_namespace: &str,
) -> Manifest {
    let source = match source {
        AppSource::Gitops { path, values } => {
            let mut source = json!({
                "repoURL": config.gitops.repo_url(),
                "path": path,
                "targetRevision": GITOPS_REVISION,
            });
            if let Some(values) = values {
                source["helm"] = json!({ "valuesObject": values });
            }
            source
        }
        AppSource::Helm {
            repo_url,
            chart,
            version,
        } => json!({
            "repoURL": repo_url,
            "chart": chart,
            "targetRevision": version,
        }),
    };

    Manifest::inline(
        format!("application {}", name),
        json!({
            "apiVersion": "argoproj.io/v1alpha1",
            "kind": "Application",
            "metadata": {
                "name": name,
                "namespace": ARGOCD_NAMESPACE,
                "finalizers": ["resources-finalizer.argocd.argoproj.io"]
            },
            "spec": {
                "project": "default",
                "source": source,
                "destination": {
                    "server": "https://kubernetes.default.svc",
                    "namespace": destination_namespace
                },
                "syncPolicy": sync_policy()
            }
        }),
    )
}

pub fn catalog_application(config: &ProvisionConfig, app: &CatalogApp) -> Manifest {
    application(
        config,
        &app.name,
        &AppSource::Helm {
            repo_url: app.repo_url.clone(),
            chart: app.chart.clone(),
            version: app.version.clone(),
        },
        &app.namespace,
    )
}

pub fn vcluster_application_name(environment: &str) -> String {
    format!("vcluster-{}", environment)
}

/// One ArgoCD Application per workload environment. The chart in the gitops
/// repository receives the environment and its host cluster as values.
pub fn vcluster_application(config: &ProvisionConfig, environment: &str) -> Manifest {
    let name = vcluster_application_name(environment);
    application(
        config,
        &name,
        &AppSource::Gitops {
            path: cluster_path(config, &format!("vclusters/{}", environment)),
            values: Some(json!({
                "vcluster": {
                    "name": environment,
                    "hostCluster": config.cluster_name,
                    "domain": format!("{}.{}", environment, config.domain_name),
                }
            })),
        },
        &name,
    )
}

/// Path of a cluster's folder in the gitops repository.
pub fn cluster_path(config: &ProvisionConfig, component: &str) -> String {
    if component.is_empty() {
        format!("registry/clusters/{}", config.cluster_name)
    } else {
        format!("registry/clusters/{}/{}", config.cluster_name, component)
    }
}

fn sync_policy() -> Value {
    json!({
        "automated": {"prune": true, "selfHeal": true},
        "syncOptions": ["CreateNamespace=true"],
        "retry": {
            "limit": 5,
            "backoff": {"duration": "5s", "factor": 2, "maxDuration": "3m"}
        }
    })
}

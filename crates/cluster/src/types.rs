use std::collections::BTreeMap;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifies a single object in the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    pub kind: String,
    pub name: String,
    pub namespace: Option<String>,
}

impl ResourceRef {
    pub fn namespaced(
        kind: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            namespace: Some(namespace.into()),
        }
    }

    pub fn cluster_scoped(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            namespace: None,
        }
    }
}

impl std::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{} in namespace {}", self.kind, self.name, ns),
            None => write!(f, "{}/{}", self.kind, self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ManifestSource {
    /// A single object or a `List`, applied from stdin
    Inline(Value),
    /// A manifest bundle fetched by the client, e.g. an upstream release
    Remote(String),
}

/// Something to apply to the cluster, named for logs and errors.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub name: String,
    /// Default namespace for objects that do not set one
    pub namespace: Option<String>,
    pub source: ManifestSource,
}

impl Manifest {
    pub fn inline(name: impl Into<String>, object: Value) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            source: ManifestSource::Inline(object),
        }
    }

    pub fn remote(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            source: ManifestSource::Remote(url.into()),
        }
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

/// The parts of an object's `status` the installer cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceState {
    /// `status.conditions[].type` → `status.conditions[].status`
    pub conditions: BTreeMap<String, String>,
    /// ArgoCD `status.health.status`
    pub health: Option<String>,
    /// ArgoCD `status.sync.status`
    pub sync: Option<String>,
    /// First `status.loadBalancer.ingress[].ip` of a Service
    pub load_balancer_ip: Option<IpAddr>,
}

impl ResourceState {
    pub fn from_object(object: &Value) -> Self {
        let status = &object["status"];

        let conditions = status["conditions"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|c| {
                        Some((
                            c["type"].as_str()?.to_string(),
                            c["status"].as_str()?.to_string(),
                        ))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let load_balancer_ip = status["loadBalancer"]["ingress"]
            .as_array()
            .and_then(|ingress| {
                ingress
                    .iter()
                    .find_map(|entry| entry["ip"].as_str()?.parse::<IpAddr>().ok())
            });

        Self {
            conditions,
            health: status["health"]["status"].as_str().map(str::to_string),
            sync: status["sync"]["status"].as_str().map(str::to_string),
            load_balancer_ip,
        }
    }

    pub fn condition_is_true(&self, condition: &str) -> bool {
        self.conditions
            .get(condition)
            .is_some_and(|status| status == "True")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceStatus {
    Missing,
    Present(ResourceState),
}

impl ResourceStatus {
    pub fn is_present(&self) -> bool {
        matches!(self, ResourceStatus::Present(_))
    }

    pub fn state(&self) -> Option<&ResourceState> {
        match self {
            ResourceStatus::Present(state) => Some(state),
            ResourceStatus::Missing => None,
        }
    }
}

/// What a resource must look like before a wait returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitCondition {
    /// The object exists
    Exists,
    /// `status.conditions` has the given type with status `True`
    Condition(String),
    /// ArgoCD Application reports `Healthy` and `Synced`
    HealthySynced,
    /// A LoadBalancer Service has been assigned an address
    LoadBalancerAssigned,
}

impl WaitCondition {
    pub fn available() -> Self {
        WaitCondition::Condition("Available".to_string())
    }

    pub fn is_met(&self, state: &ResourceState) -> bool {
        match self {
            WaitCondition::Exists => true,
            WaitCondition::Condition(condition) => state.condition_is_true(condition),
            WaitCondition::HealthySynced => {
                state.health.as_deref() == Some("Healthy")
                    && state.sync.as_deref() == Some("Synced")
            }
            WaitCondition::LoadBalancerAssigned => state.load_balancer_ip.is_some(),
        }
    }
}

impl std::fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaitCondition::Exists => f.write_str("present"),
            WaitCondition::Condition(condition) => write!(f, "{}", condition),
            WaitCondition::HealthySynced => f.write_str("Healthy/Synced"),
            WaitCondition::LoadBalancerAssigned => f.write_str("assigned a load balancer address"),
        }
    }
}

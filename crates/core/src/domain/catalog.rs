use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

/// An application that can be installed on top of the platform once it is up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogApp {
    /// Identifier used on the command line (`--install-catalog-apps`)
    pub name: String,
    /// Helm repository hosting the chart
    pub repo_url: String,
    /// Chart name inside the repository
    pub chart: String,
    /// Chart version to pin
    pub version: String,
    /// Namespace the app is installed into
    pub namespace: String,
}

impl CatalogApp {
    pub fn new(
        name: impl Into<String>,
        repo_url: impl Into<String>,
        chart: impl Into<String>,
        version: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            repo_url: repo_url.into(),
            chart: chart.into(),
            version: version.into(),
            namespace: namespace.into(),
        }
    }
}

/// The set of catalog apps known to this installer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default, rename = "app")]
    apps: Vec<CatalogApp>,
}

impl Catalog {
    pub fn new(apps: Vec<CatalogApp>) -> Self {
        Self { apps }
    }

    pub fn builtin() -> Self {
        Self::new(vec![
            CatalogApp::new(
                "argo-workflows",
                "https://argoproj.github.io/argo-helm",
                "argo-workflows",
                "0.41.14",
                "argo",
            ),
            CatalogApp::new(
                "cloudnative-pg",
                "https://cloudnative-pg.github.io/charts",
                "cloudnative-pg",
                "0.22.0",
                "cnpg-system",
            ),
            CatalogApp::new(
                "harbor",
                "https://helm.goharbor.io",
                "harbor",
                "1.15.1",
                "harbor",
            ),
            CatalogApp::new(
                "keda",
                "https://kedacore.github.io/charts",
                "keda",
                "2.15.1",
                "keda",
            ),
            CatalogApp::new(
                "kubecost",
                "https://kubecost.github.io/cost-analyzer",
                "cost-analyzer",
                "2.3.3",
                "kubecost",
            ),
            CatalogApp::new(
                "kyverno",
                "https://kyverno.github.io/kyverno",
                "kyverno",
                "3.2.6",
                "kyverno",
            ),
        ])
    }

    pub fn get(&self, name: &str) -> Option<&CatalogApp> {
        self.apps.iter().find(|app| app.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.apps.iter().map(|app| app.name.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    /// Resolve a comma separated list of app names against the catalog.
    ///
    /// Blank entries are ignored and repeated names are installed once, in
    /// the order they first appear.
    pub fn resolve(&self, requested: &str) -> Result<Vec<CatalogApp>> {
        let mut resolved: Vec<CatalogApp> = Vec::new();

        for name in requested.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            if resolved.iter().any(|app| app.name == name) {
                continue;
            }
            let app = self
                .get(name)
                .ok_or_else(|| ValidationError::UnknownCatalogApp {
                    name: name.to_string(),
                    known: self.names(),
                })?;
            resolved.push(app.clone());
        }

        Ok(resolved)
    }
}

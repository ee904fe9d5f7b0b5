use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{ClusterError, Result};
use crate::traits::{ClusterClient, DEFAULT_POLL_INTERVAL};
use crate::types::{Manifest, ManifestSource, ResourceRef, ResourceState, ResourceStatus};

/// [`ClusterClient`] that shells out to `kubectl` with an explicit kubeconfig.
pub struct KubectlClient {
    kubeconfig: PathBuf,
    binary: String,
    poll_interval: Duration,
}

impl KubectlClient {
    pub fn new(kubeconfig: impl Into<PathBuf>) -> Self {
        Self {
            kubeconfig: kubeconfig.into(),
            binary: "kubectl".to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn kubeconfig(&self) -> &Path {
        &self.kubeconfig
    }

    async fn run_kubectl(&self, args: &[&str], stdin: Option<&[u8]>) -> Result<String> {
        debug!("Running {} {:?}", self.binary, args);

        let mut child = Command::new(&self.binary)
            .arg("--kubeconfig")
            .arg(&self.kubeconfig)
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ClusterError::CommandNotFound(self.binary.clone()),
                _ => ClusterError::Io(e),
            })?;

        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(input).await?;
        }

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if is_not_found(&stderr) {
                return Err(ClusterError::NotFound(args.join(" ")));
            }
            return Err(ClusterError::CommandFailed(format!(
                "{} {} failed: {}",
                self.binary,
                args.join(" "),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn is_not_found(stderr: &str) -> bool {
    stderr.contains("(NotFound)") || stderr.contains("NotFound:")
}

fn get_args(resource: &ResourceRef) -> Vec<&str> {
    let mut args = vec!["get", resource.kind.as_str(), resource.name.as_str()];
    if let Some(ns) = &resource.namespace {
        args.extend(["--namespace", ns.as_str()]);
    }
    args.extend(["--output", "json"]);
    args
}

fn apply_args(manifest: &Manifest) -> Result<(Vec<String>, Option<Vec<u8>>)> {
    let mut args = vec!["apply".to_string()];
    if let Some(ns) = &manifest.namespace {
        args.extend(["--namespace".to_string(), ns.clone()]);
    }

    match &manifest.source {
        ManifestSource::Inline(object) => {
            args.extend(["--filename".to_string(), "-".to_string()]);
            Ok((args, Some(serde_json::to_vec(object)?)))
        }
        // Upstream bundles carry CRDs too large for client-side apply annotations
        ManifestSource::Remote(url) => {
            args.extend([
                "--server-side".to_string(),
                "--force-conflicts".to_string(),
                "--filename".to_string(),
                url.clone(),
            ]);
            Ok((args, None))
        }
    }
}

#[async_trait]
impl ClusterClient for KubectlClient {
    fn name(&self) -> &'static str {
        "kubectl"
    }

    async fn apply_manifest(&self, manifest: &Manifest) -> Result<()> {
        info!("Applying {}", manifest.name);
        let (args, stdin) = apply_args(manifest)?;
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run_kubectl(&args, stdin.as_deref()).await?;
        Ok(())
    }

    async fn get_resource_status(&self, resource: &ResourceRef) -> Result<ResourceStatus> {
        match self.run_kubectl(&get_args(resource), None).await {
            Ok(stdout) => {
                let object: serde_json::Value = serde_json::from_str(&stdout)?;
                Ok(ResourceStatus::Present(ResourceState::from_object(&object)))
            }
            Err(ClusterError::NotFound(_)) => Ok(ResourceStatus::Missing),
            Err(e) => Err(e),
        }
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

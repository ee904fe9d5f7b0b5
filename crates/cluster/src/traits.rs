use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{ClusterError, Result};
use crate::types::{Manifest, ResourceRef, ResourceState, ResourceStatus, WaitCondition};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Operations the installer performs against the target cluster
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Get the name of the client backend
    fn name(&self) -> &'static str;

    /// Create or update the objects in a manifest
    async fn apply_manifest(&self, manifest: &Manifest) -> Result<()>;

    /// Read the current status of a resource; a missing object is not an error
    async fn get_resource_status(&self, resource: &ResourceRef) -> Result<ResourceStatus>;

    /// Delay between readiness polls
    fn poll_interval(&self) -> Duration {
        DEFAULT_POLL_INTERVAL
    }

    /// Poll until `condition` holds for `resource` or `timeout` elapses.
    ///
    /// Transient read failures are retried until the deadline.
    async fn wait_for_condition(
        &self,
        resource: &ResourceRef,
        condition: &WaitCondition,
        timeout: Duration,
    ) -> Result<ResourceState> {
        let deadline = Instant::now() + timeout;

        loop {
            match self.get_resource_status(resource).await {
                Ok(ResourceStatus::Present(state)) if condition.is_met(&state) => {
                    debug!("{} is {}", resource, condition);
                    return Ok(state);
                }
                Ok(_) => debug!("Waiting for {} to become {}", resource, condition),
                Err(e) if e.is_transient() => warn!("Polling {} failed: {}", resource, e),
                Err(e) => return Err(e),
            }

            if Instant::now() >= deadline {
                return Err(ClusterError::Timeout {
                    resource: resource.to_string(),
                    condition: condition.to_string(),
                    after: timeout,
                });
            }

            tokio::time::sleep(self.poll_interval()).await;
        }
    }
}

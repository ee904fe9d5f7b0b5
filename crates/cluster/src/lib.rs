pub mod error;
pub mod kubectl;
pub mod traits;
pub mod types;

pub use error::{ClusterError, Result};
pub use kubectl::KubectlClient;
pub use traits::{ClusterClient, DEFAULT_POLL_INTERVAL};
pub use types::{
    Manifest, ManifestSource, ResourceRef, ResourceState, ResourceStatus, WaitCondition,
};

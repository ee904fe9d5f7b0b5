use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("{resource} did not become {condition} within {}s", .after.as_secs())]
    Timeout {
        resource: String,
        condition: String,
        after: Duration,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl ClusterError {
    /// Failures worth another attempt while polling for readiness, such as
    /// an API server that briefly refuses connections.
    pub fn is_transient(&self) -> bool {
        matches!(self, ClusterError::CommandFailed(_))
    }
}

impl From<serde_json::Error> for ClusterError {
    fn from(err: serde_json::Error) -> Self {
        ClusterError::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClusterError>;

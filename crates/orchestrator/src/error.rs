use std::time::Duration;

use cluster::ClusterError;
use edge::EdgeError;
use platform_core::ValidationError;
use thiserror::Error;

/// Why a single phase did not complete.
#[derive(Debug, Error)]
pub enum PhaseError {
    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error(transparent)]
    Edge(#[from] EdgeError),

    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("precondition not met: {0}")]
    Precondition(String),

    #[error("cancelled")]
    Cancelled,

    #[error("{0}")]
    Failed(String),
}

impl PhaseError {
    pub fn precondition(reason: impl Into<String>) -> Self {
        Self::Precondition(reason.into())
    }
}

/// Terminal error of a provisioning run.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("phase '{phase}' failed: {source}")]
    PhaseFailed { phase: String, source: PhaseError },

    #[error("provisioning cancelled during {}", .phase.as_deref().unwrap_or("startup"))]
    Cancelled { phase: Option<String> },

    #[error("Invalid run state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

impl ProvisionError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProvisionError::Cancelled { .. })
    }

    /// Phase the run stopped in, if it got that far
    pub fn phase(&self) -> Option<&str> {
        match self {
            ProvisionError::PhaseFailed { phase, .. } => Some(phase),
            ProvisionError::Cancelled { phase } => phase.as_deref(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProvisionError>;
pub type PhaseResult<T = ()> = std::result::Result<T, PhaseError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_phase_failed_names_phase() {
        let err = ProvisionError::PhaseFailed {
            phase: "install-argocd".to_string(),
            source: PhaseError::Timeout(Duration::from_secs(900)),
        };

        assert_eq!(err.phase(), Some("install-argocd"));
        assert!(err.to_string().contains("install-argocd"));
        assert!(err.to_string().contains("900s"));
        assert!(err.source().is_some());
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_cancelled() {
        let err = ProvisionError::Cancelled {
            phase: Some("install-vault".to_string()),
        };
        assert!(err.is_cancelled());
        assert_eq!(err.phase(), Some("install-vault"));

        let early = ProvisionError::Cancelled { phase: None };
        assert_eq!(early.to_string(), "provisioning cancelled during startup");
    }

    #[test]
    fn test_validation_is_not_tagged_with_phase() {
        let err: ProvisionError =
            ValidationError::UnsupportedGitProvider("bitbucket".to_string()).into();
        assert!(err.phase().is_none());
        assert!(err.to_string().contains("bitbucket"));
    }

    #[test]
    fn test_cluster_error_is_transparent() {
        let err: PhaseError = ClusterError::CommandNotFound("kubectl".to_string()).into();
        assert_eq!(err.to_string(), "Command not found: kubectl");
    }
}

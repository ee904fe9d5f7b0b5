use thiserror::Error;

/// Raised by the configuration gate before any infrastructure is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unsupported git provider '{0}', expected one of: github, gitlab")]
    UnsupportedGitProvider(String),

    #[error("unsupported git protocol '{0}', expected one of: https, ssh")]
    UnsupportedGitProtocol(String),

    #[error("unsupported cluster type '{0}', expected one of: mgmt, workload")]
    UnsupportedClusterType(String),

    #[error("unsupported dns provider '{0}', expected one of: cloudflare")]
    UnsupportedDnsProvider(String),

    #[error("unknown catalog app '{name}', available apps: {}", .known.join(", "))]
    UnknownCatalogApp { name: String, known: Vec<String> },

    #[error("unknown halt phase '{name}', expected one of: {}", .known.join(", "))]
    UnknownHaltPhase { name: String, known: Vec<String> },

    #[error("missing required value: {0}")]
    Missing(&'static str),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ValidationError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ValidationError>;

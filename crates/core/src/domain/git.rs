use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GitProvider {
    Github,
    Gitlab,
}

impl GitProvider {
    pub const SUPPORTED: &'static [&'static str] = &["github", "gitlab"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Github => "github",
            Self::Gitlab => "gitlab",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "github" => Some(Self::Github),
            "gitlab" => Some(Self::Gitlab),
            _ => None,
        }
    }

    pub fn validate(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| ValidationError::UnsupportedGitProvider(s.to_string()))
    }

    pub fn host(&self) -> &'static str {
        match self {
            Self::Github => "github.com",
            Self::Gitlab => "gitlab.com",
        }
    }

    /// Name of the flag that carries the repository owner for this provider.
    pub fn owner_flag(&self) -> &'static str {
        match self {
            Self::Github => "github-org",
            Self::Gitlab => "gitlab-group",
        }
    }

    pub fn repo_url(&self, protocol: GitProtocol, owner: &str, repo: &str) -> String {
        match protocol {
            GitProtocol::Https => format!("https://{}/{}/{}.git", self.host(), owner, repo),
            GitProtocol::Ssh => format!("git@{}:{}/{}.git", self.host(), owner, repo),
        }
    }
}

impl std::fmt::Display for GitProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum GitProtocol {
    Https,
    #[default]
    Ssh,
}

impl GitProtocol {
    pub const SUPPORTED: &'static [&'static str] = &["https", "ssh"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Https => "https",
            Self::Ssh => "ssh",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "https" => Some(Self::Https),
            "ssh" => Some(Self::Ssh),
            _ => None,
        }
    }

    pub fn validate(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| ValidationError::UnsupportedGitProtocol(s.to_string()))
    }
}

impl std::fmt::Display for GitProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parse() {
        assert_eq!(GitProvider::parse("github"), Some(GitProvider::Github));
        assert_eq!(GitProvider::parse("gitlab"), Some(GitProvider::Gitlab));
        assert_eq!(GitProvider::parse("GitHub"), None);
        assert_eq!(GitProvider::parse("bitbucket"), None);
    }

    #[test]
    fn test_provider_validate_error() {
        let err = GitProvider::validate("gitea").unwrap_err();
        assert_eq!(err, ValidationError::UnsupportedGitProvider("gitea".to_string()));
    }

    #[test]
    fn test_protocol_default_is_ssh() {
        assert_eq!(GitProtocol::default(), GitProtocol::Ssh);
        assert!(GitProtocol::validate("ftp").is_err());
    }

    #[test]
    fn test_repo_url() {
        assert_eq!(
            GitProvider::Github.repo_url(GitProtocol::Ssh, "acme", "harvester-argo"),
            "git@github.com:acme/harvester-argo.git"
        );
        assert_eq!(
            GitProvider::Gitlab.repo_url(GitProtocol::Https, "platform", "gitops"),
            "https://gitlab.com/platform/gitops.git"
        );
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&GitProvider::Gitlab).unwrap();
        assert_eq!(json, "\"gitlab\"");
    }
}

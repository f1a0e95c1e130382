//! GitHub API client using octocrab

use crate::{Error, Result};
use octocrab::Octocrab;
use shipnote_core::Secrets;
use tracing::info;

/// GitHub API client for one repository
pub struct GitHubClient {
    client: Octocrab,
    owner: String,
    repo: String,
}

impl GitHubClient {
    /// Create a client for the repository using an explicit token
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, token: String) -> Result<Self> {
        let owner = owner.into();
        let repo = repo.into();

        let client = Octocrab::builder()
            .personal_token(token)
            .build()
            .map_err(|e| Error::Auth(format!("Failed to create GitHub client: {}", e)))?;

        info!(owner = %owner, repo = %repo, "Created GitHub client");

        Ok(Self {
            client,
            owner,
            repo,
        })
    }

    /// Create a client with the token from the environment or secrets file
    ///
    /// Token is loaded from (in priority order):
    /// 1. GITHUB_TOKEN environment variable
    /// 2. ~/.config/shipnote/secrets.toml
    pub fn from_secrets(
        owner: impl Into<String>,
        repo: impl Into<String>,
        secrets: &Secrets,
    ) -> Result<Self> {
        let token = secrets.github_token().ok_or_else(|| {
            Error::Auth(
                "GitHub token not found. Set GITHUB_TOKEN environment variable \
                 or add github_token to ~/.config/shipnote/secrets.toml"
                    .to_string(),
            )
        })?;

        Self::new(owner, repo, token)
    }

    /// Get the repository owner
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Get the repository name
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Get the underlying octocrab client
    pub fn client(&self) -> &Octocrab {
        &self.client
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}

/// Parse a GitHub repository reference into owner and repo
///
/// Supports formats:
/// - owner/repo (as in `GITHUB_REPOSITORY`)
/// - https://github.com/owner/repo
/// - git@github.com:owner/repo.git
pub fn parse_github_url(url: &str) -> Result<(String, String)> {
    if !url.contains(':') && !url.contains('/') {
        return Err(Error::Parse(format!(
            "Invalid repository format: {}. Expected owner/repo",
            url
        )));
    }

    if !url.contains("://") && !url.contains('@') {
        let parts: Vec<&str> = url.split('/').collect();
        if let [owner, repo] = parts.as_slice() {
            if !owner.is_empty() && !repo.is_empty() {
                return Ok((owner.to_string(), repo.trim_end_matches(".git").to_string()));
            }
        }
        return Err(Error::Parse(format!(
            "Invalid repository format: {}. Expected owner/repo",
            url
        )));
    }

    if url.starts_with("https://") || url.starts_with("http://") {
        let url = url::Url::parse(url).map_err(|e| Error::Parse(e.to_string()))?;
        let path = url.path().trim_start_matches('/').trim_end_matches(".git");
        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() >= 2 {
            return Ok((parts[0].to_string(), parts[1].to_string()));
        }
        return Err(Error::Parse(format!("Invalid GitHub URL path: {}", path)));
    }

    if url.starts_with("git@") {
        if let Some(path) = url.split(':').nth(1) {
            let path = path.trim_end_matches(".git");
            let parts: Vec<&str> = path.split('/').collect();
            if parts.len() >= 2 {
                return Ok((parts[0].to_string(), parts[1].to_string()));
            }
        }
        return Err(Error::Parse(format!("Invalid SSH URL: {}", url)));
    }

    Err(Error::Parse(format!("Unrecognized URL format: {}", url)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shorthand() {
        let (owner, repo) = parse_github_url("acme/shop").unwrap();
        assert_eq!(owner, "acme");
        assert_eq!(repo, "shop");
    }

    #[test]
    fn test_parse_https_url() {
        let (owner, repo) = parse_github_url("https://github.com/acme/shop.git").unwrap();
        assert_eq!(owner, "acme");
        assert_eq!(repo, "shop");
    }

    #[test]
    fn test_parse_ssh_url() {
        let (owner, repo) = parse_github_url("git@github.com:acme/shop.git").unwrap();
        assert_eq!(owner, "acme");
        assert_eq!(repo, "shop");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_github_url("invalid").is_err());
        assert!(parse_github_url("acme/").is_err());
        assert!(parse_github_url("a/b/c").is_err());
    }

    #[test]
    fn test_missing_token_is_auth_error() {
        let secrets = Secrets::default();
        if secrets.github_token().is_some() {
            // GITHUB_TOKEN is set in this environment
            return;
        }
        let err = GitHubClient::from_secrets("acme", "shop", &secrets).unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }
}

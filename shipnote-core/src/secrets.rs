//! Secrets management for shipnote
//!
//! Secrets are stored separately from configuration to avoid accidental sharing.
//! The secrets file is located at `~/.config/shipnote/secrets.toml` and must have
//! restrictive permissions (0600 on Unix).
//!
//! Loading priority:
//! 1. Environment variables (GITHUB_TOKEN, ASANA_PAT, SLACK_BOT_TOKEN)
//! 2. Secrets file (~/.config/shipnote/secrets.toml)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Secrets structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Secrets {
    /// GitHub token
    pub github_token: Option<String>,
    /// Asana personal access token
    pub asana_pat: Option<String>,
    /// Slack bot token
    pub slack_bot_token: Option<String>,
}

impl Secrets {
    /// Load secrets from the default location
    ///
    /// Returns default (empty) secrets if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_secrets_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load secrets from a specific file with permission checking
    pub fn load_from_file(path: &Path) -> Result<Self> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mode = std::fs::metadata(path).map_err(Error::Io)?.permissions().mode();

            if mode & 0o077 != 0 {
                return Err(Error::Config(format!(
                    "Secrets file {} has insecure permissions {:o}. \
                     Please run: chmod 600 {}",
                    path.display(),
                    mode & 0o777,
                    path.display()
                )));
            }
        }

        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        let secrets: Secrets = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse secrets: {}", e)))?;

        Ok(secrets)
    }

    /// Get the default secrets file path
    ///
    /// Returns `~/.config/shipnote/secrets.toml` on Unix
    pub fn default_secrets_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("shipnote").join("secrets.toml"))
    }

    /// GitHub token; `GITHUB_TOKEN` wins over the secrets file
    pub fn github_token(&self) -> Option<String> {
        pick("GITHUB_TOKEN", self.github_token.as_deref())
    }

    /// Asana token; `ASANA_PAT` wins over the secrets file
    pub fn asana_pat(&self) -> Option<String> {
        pick("ASANA_PAT", self.asana_pat.as_deref())
    }

    /// Slack bot token; `SLACK_BOT_TOKEN` wins over the secrets file
    pub fn slack_bot_token(&self) -> Option<String> {
        pick("SLACK_BOT_TOKEN", self.slack_bot_token.as_deref())
    }
}

fn pick(env_var: &str, from_file: Option<&str>) -> Option<String> {
    if let Ok(token) = std::env::var(env_var) {
        let token = token.trim();
        if !token.is_empty() {
            debug!(env_var, "Using token from environment");
            return Some(token.to_string());
        }
    }

    non_empty(from_file)
}

fn non_empty(token: Option<&str>) -> Option<String> {
    token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

//! Configuration management for shipnote
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (SHIPNOTE_*)
//! 3. Config file (`--config` or ~/.config/shipnote/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::history::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::status::LifecycleState;
use crate::{Error, FailurePolicy, Result};

/// GitHub-related configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Page size for commit and comment listings (clamped to 1..=100)
    pub page_size: u8,
}

impl GitHubConfig {
    fn normalized(mut self) -> Self {
        let clamped = self.page_size.clamp(1, MAX_PAGE_SIZE);
        if clamped != self.page_size {
            warn!(
                configured = self.page_size,
                using = clamped,
                "GitHub page size out of range, clamping"
            );
            self.page_size = clamped;
        }
        self
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Tracker enum-option codes for each lifecycle state
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StatusCodes {
    pub under_review: String,
    pub in_staging: String,
    pub in_production: String,
}

impl Default for StatusCodes {
    fn default() -> Self {
        Self {
            under_review: "1153933847862684".to_string(),
            in_staging: "1149901879873105".to_string(),
            in_production: "1149901879873107".to_string(),
        }
    }
}

impl StatusCodes {
    /// The opaque code written for `state`
    pub fn code_for(&self, state: LifecycleState) -> &str {
        match state {
            LifecycleState::UnderReview => &self.under_review,
            LifecycleState::InStaging => &self.in_staging,
            LifecycleState::InProduction => &self.in_production,
        }
    }
}

/// Task tracker (Asana) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// REST API base URL
    pub base_url: String,
    /// Custom field holding the QA status
    pub status_field: String,
    /// Status codes per lifecycle state
    pub status_codes: StatusCodes,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://app.asana.com/api/1.0".to_string(),
            status_field: "1149901879873102".to_string(),
            status_codes: StatusCodes::default(),
        }
    }
}

/// Messaging (Slack) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SlackConfig {
    /// Web API base URL
    pub base_url: String,
    /// Channel for release notes; notes are skipped when unset
    pub channel_id: Option<String>,
    /// Key of the hidden PR comment holding the thread id
    pub thread_key: String,
    /// Context line appended to every release note
    pub audience_tag: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            base_url: "https://slack.com/api".to_string(),
            channel_id: None,
            thread_key: "slack-thread-id".to_string(),
            audience_tag: "notify <!subteam^S05SL1L1XE2>".to_string(),
        }
    }
}

/// Target branch names per lifecycle state
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BranchConfig {
    pub review: Vec<String>,
    pub staging: Vec<String>,
    pub production: Vec<String>,
}

impl Default for BranchConfig {
    fn default() -> Self {
        Self {
            review: vec!["master".to_string(), "main".to_string(), "develop".to_string()],
            staging: vec!["staging".to_string()],
            production: vec!["prod".to_string(), "production".to_string()],
        }
    }
}

impl BranchConfig {
    /// Map a PR's target branch to the lifecycle state it implies
    pub fn resolve(&self, branch: &str) -> Option<LifecycleState> {
        let matches = |names: &[String]| names.iter().any(|n| n.eq_ignore_ascii_case(branch));

        if matches(&self.production) {
            Some(LifecycleState::InProduction)
        } else if matches(&self.staging) {
            Some(LifecycleState::InStaging)
        } else if matches(&self.review) {
            Some(LifecycleState::UnderReview)
        } else {
            None
        }
    }
}

/// HTTP client settings shared by the tracker and messaging clients
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

/// Failure handling choices
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Fail the run when a single-PR status update fails
    pub strict_status_updates: bool,
    /// Fail the run when any child PR of a release cannot be fetched
    pub strict_child_fetch: bool,
}

impl PolicyConfig {
    /// Policy for the single-PR status update path
    pub fn status_updates(&self) -> FailurePolicy {
        FailurePolicy::strict_if(self.strict_status_updates)
    }

    /// Policy for fetching child PR descriptions
    pub fn child_fetch(&self) -> FailurePolicy {
        FailurePolicy::strict_if(self.strict_child_fetch)
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub github: GitHubConfig,
    pub tracker: TrackerConfig,
    pub slack: SlackConfig,
    pub branches: BranchConfig,
    pub http: HttpConfig,
    pub policy: PolicyConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/shipnote/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("shipnote").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - SHIPNOTE_SLACK_CHANNEL: Slack channel id
    /// - SHIPNOTE_STATUS_FIELD: Tracker custom field id
    /// - SHIPNOTE_PAGE_SIZE: GitHub listing page size
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(channel) = std::env::var("SHIPNOTE_SLACK_CHANNEL") {
            if !channel.trim().is_empty() {
                self.slack.channel_id = Some(channel.trim().to_string());
            }
        }

        if let Ok(field) = std::env::var("SHIPNOTE_STATUS_FIELD") {
            self.tracker.status_field = field;
        }

        if let Some(page_size) = std::env::var("SHIPNOTE_PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.github.page_size = page_size;
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, channel_id: Option<String>) -> Self {
        if let Some(channel) = channel_id {
            self.slack.channel_id = Some(channel);
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(path: Option<&Path>, channel_id: Option<String>) -> Result<Self> {
        let base = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load()?,
        };

        let mut config = base.with_env_overrides().with_cli_overrides(channel_id);
        config.github = config.github.normalized();
        Ok(config)
    }
}

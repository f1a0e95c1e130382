//! Collaborator interfaces for the code host, task tracker and messaging service
//!
//! The pipeline only depends on these traits. Concrete clients live in
//! `shipnote-github` and `shipnote-integrations`; tests use the in-memory
//! fakes in the `testing` module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::notes::NotificationPayload;
use crate::Result;

/// A commit as listed on a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Commit SHA
    pub sha: String,
    /// Full commit message
    pub message: String,
}

impl Commit {
    /// Create a commit record
    pub fn new(sha: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sha: sha.into(),
            message: message.into(),
        }
    }
}

/// A conversation comment on a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment ID
    pub id: u64,
    /// Comment body (empty when the API returned none)
    pub body: String,
}

/// Task data as returned by the tracker; every field may be missing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerTask {
    /// Task name
    pub name: Option<String>,
    /// Display name of the assignee
    pub assignee: Option<String>,
}

/// Result of posting a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedMessage {
    /// Message identifier, usable as a thread id for later replies
    pub id: String,
}

/// Pull request data source (GitHub)
#[async_trait]
pub trait CodeHost: Send + Sync {
    /// List one page of commits on a pull request (pages start at 1)
    async fn list_commits(&self, pr_number: u64, page: u32, per_page: u8) -> Result<Vec<Commit>>;

    /// Fetch the description (body) of a pull request
    async fn pr_description(&self, pr_number: u64) -> Result<String>;

    /// List one page of conversation comments on a pull request (pages start at 1)
    async fn list_comments(&self, pr_number: u64, page: u32, per_page: u8)
        -> Result<Vec<Comment>>;

    /// Append a new comment to a pull request
    async fn create_comment(&self, pr_number: u64, body: &str) -> Result<()>;
}

/// Task tracker (Asana)
#[async_trait]
pub trait TaskTracker: Send + Sync {
    /// Fetch display metadata for a task
    async fn get_task(&self, task_id: &str) -> Result<TrackerTask>;

    /// Set a custom field on a task to an opaque value
    async fn set_custom_field(&self, task_id: &str, field_key: &str, value: &str) -> Result<()>;
}

/// Messaging service (Slack)
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Post a payload to a channel, as a threaded reply when `thread_id` is set
    async fn post_message(
        &self,
        channel_id: &str,
        payload: &NotificationPayload,
        thread_id: Option<&str>,
    ) -> Result<PostedMessage>;
}

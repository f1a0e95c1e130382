//! Asana REST client

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use shipnote_core::{Secrets, TaskTracker, TrackerTask};
use tracing::debug;

use crate::http::{check_status, endpoint};
use crate::{Error, Result};

/// `{"data": ...}` envelope used by every Asana response
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct TaskData {
    name: Option<String>,
    assignee: Option<AssigneeData>,
}

#[derive(Debug, Deserialize)]
struct AssigneeData {
    name: Option<String>,
}

impl From<TaskData> for TrackerTask {
    fn from(task: TaskData) -> Self {
        TrackerTask {
            name: task.name,
            assignee: task.assignee.and_then(|a| a.name),
        }
    }
}

/// Asana client for task lookups and custom field updates
pub struct AsanaClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl AsanaClient {
    /// Create a client with an explicit personal access token
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, token: String) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            token,
        }
    }

    /// Create a client with the token from `ASANA_PAT` or the secrets file
    pub fn from_secrets(
        http: reqwest::Client,
        base_url: impl Into<String>,
        secrets: &Secrets,
    ) -> Result<Self> {
        let token = secrets.asana_pat().ok_or_else(|| {
            Error::Auth(
                "Asana token not found. Set ASANA_PAT environment variable \
                 or add asana_pat to ~/.config/shipnote/secrets.toml"
                    .to_string(),
            )
        })?;
        Ok(Self::new(http, base_url, token))
    }

    /// Fetch a task's name and assignee
    pub async fn get_task(&self, task_id: &str) -> Result<TrackerTask> {
        debug!(task_id, "Fetching Asana task");

        let mut url = endpoint(&self.base_url, &["tasks", task_id])?;
        url.query_pairs_mut().append_pair("opt_fields", "name,assignee.name");

        let response = self.http.get(url).bearer_auth(&self.token).send().await?;
        let envelope: Envelope<TaskData> = check_status(response).await?.json().await?;

        Ok(envelope.data.into())
    }

    /// Set one custom field on a task
    pub async fn set_custom_field(&self, task_id: &str, field_key: &str, value: &str) -> Result<()> {
        debug!(task_id, field_key, value, "Updating Asana custom field");

        let url = endpoint(&self.base_url, &["tasks", task_id])?;
        let response = self
            .http
            .put(url)
            .bearer_auth(&self.token)
            .json(&custom_field_body(field_key, value))
            .send()
            .await?;
        check_status(response).await?;

        Ok(())
    }
}

fn custom_field_body(field_key: &str, value: &str) -> serde_json::Value {
    json!({
        "data": {
            "custom_fields": {
                field_key: value,
            },
        },
    })
}

impl std::fmt::Debug for AsanaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsanaClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TaskTracker for AsanaClient {
    async fn get_task(&self, task_id: &str) -> shipnote_core::Result<TrackerTask> {
        AsanaClient::get_task(self, task_id)
            .await
            .map_err(Error::into_tracker)
    }

    async fn set_custom_field(
        &self,
        task_id: &str,
        field_key: &str,
        value: &str,
    ) -> shipnote_core::Result<()> {
        AsanaClient::set_custom_field(self, task_id, field_key, value)
            .await
            .map_err(Error::into_tracker)
    }
}

//! Slack Web API client

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use shipnote_core::{Messenger, NotificationPayload, PostedMessage, Secrets};
use tracing::{debug, info};

use crate::http::{check_status, endpoint};
use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    ts: Option<String>,
    error: Option<String>,
}

/// Slack client posting release notes with `chat.postMessage`
pub struct SlackClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl SlackClient {
    /// Create a client with an explicit bot token
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, token: String) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            token,
        }
    }

    /// Create a client with the token from `SLACK_BOT_TOKEN` or the secrets file
    pub fn from_secrets(
        http: reqwest::Client,
        base_url: impl Into<String>,
        secrets: &Secrets,
    ) -> Result<Self> {
        let token = secrets.slack_bot_token().ok_or_else(|| {
            Error::Auth(
                "Slack token not found. Set SLACK_BOT_TOKEN environment variable \
                 or add slack_bot_token to ~/.config/shipnote/secrets.toml"
                    .to_string(),
            )
        })?;
        Ok(Self::new(http, base_url, token))
    }

    /// Post a release note, as a reply when `thread_ts` is set
    ///
    /// Returns the message timestamp, which doubles as the thread id.
    pub async fn post_release_note(
        &self,
        channel_id: &str,
        payload: &NotificationPayload,
        thread_ts: Option<&str>,
    ) -> Result<String> {
        debug!(channel_id, ?thread_ts, "Posting Slack message");

        let url = endpoint(&self.base_url, &["chat.postMessage"])?;
        let mut body = json!({
            "channel": channel_id,
            "text": payload.headline(),
            "blocks": render_blocks(payload),
        });
        if let Some(ts) = thread_ts {
            body["thread_ts"] = Value::String(ts.to_string());
        }

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        let response: PostMessageResponse = check_status(response).await?.json().await?;

        let ts = parse_post_response(response)?;
        info!(channel_id, ts = %ts, "Posted Slack message");
        Ok(ts)
    }
}

fn parse_post_response(response: PostMessageResponse) -> Result<String> {
    if !response.ok {
        return Err(Error::Slack(
            response.error.unwrap_or_else(|| "unknown_error".to_string()),
        ));
    }
    response
        .ts
        .ok_or_else(|| Error::Parse("chat.postMessage response missing ts".to_string()))
}

/// Render a payload as Block Kit blocks
///
/// Layout: headline, repository/PR/env fields, task list, divider, audience tag.
pub fn render_blocks(payload: &NotificationPayload) -> Value {
    let header = &payload.header;
    let tasks = if payload.entries.is_empty() {
        payload.task_lines()
    } else {
        format!("Asana tickets included:\n{}", payload.task_lines())
    };

    json!([
        {
            "type": "section",
            "text": { "type": "mrkdwn", "text": payload.headline() },
        },
        {
            "type": "section",
            "fields": [
                { "type": "mrkdwn", "text": format!("*Repository:* {}", header.repo) },
                { "type": "mrkdwn", "text": format!("*PR:* {}", header.pr_link()) },
                { "type": "mrkdwn", "text": format!("*Env:* {}", header.environment) },
            ],
        },
        {
            "type": "section",
            "text": { "type": "mrkdwn", "text": tasks },
        },
        { "type": "divider" },
        {
            "type": "context",
            "elements": [
                { "type": "mrkdwn", "text": header.audience_tag },
            ],
        },
    ])
}

impl std::fmt::Debug for SlackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Messenger for SlackClient {
    async fn post_message(
        &self,
        channel_id: &str,
        payload: &NotificationPayload,
        thread_id: Option<&str>,
    ) -> shipnote_core::Result<PostedMessage> {
        let id = self
            .post_release_note(channel_id, payload, thread_id)
            .await
            .map_err(Error::into_messaging)?;
        Ok(PostedMessage { id })
    }
}

//! Shared HTTP plumbing

use std::time::Duration;

use url::Url;

use crate::{Error, Result};

const USER_AGENT: &str = concat!("shipnote/", env!("CARGO_PKG_VERSION"));

/// Build the reqwest client shared by the Asana and Slack clients
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(Error::Http)
}

/// Join `segments` onto a base URL, keeping the base's own path
pub(crate) fn endpoint(base_url: &str, segments: &[&str]) -> Result<Url> {
    let mut url =
        Url::parse(base_url).map_err(|e| Error::Parse(format!("Invalid base URL {}: {}", base_url, e)))?;

    url.path_segments_mut()
        .map_err(|_| Error::Parse(format!("Base URL cannot have a path: {}", base_url)))?
        .pop_if_empty()
        .extend(segments);

    Ok(url)
}

/// Turn a non-success response into [`Error::Status`]
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read response".to_string());
    Err(Error::Status {
        status: status.as_u16(),
        body: body.chars().take(500).collect(),
    })
}

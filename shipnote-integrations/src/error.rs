//! Error types for tracker and messaging calls

use thiserror::Error;

/// Result type for integration calls
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur talking to Asana or Slack
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("Request failed with status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body (possibly truncated)
        body: String,
    },

    /// Slack returned `ok: false`
    #[error("Slack API error: {0}")]
    Slack(String),

    /// Missing token
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Invalid base URL or unexpected response shape
    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    pub(crate) fn into_tracker(self) -> shipnote_core::Error {
        match self {
            Error::Auth(msg) => shipnote_core::Error::Config(msg),
            other => shipnote_core::Error::Tracker(other.to_string()),
        }
    }

    pub(crate) fn into_messaging(self) -> shipnote_core::Error {
        match self {
            Error::Auth(msg) => shipnote_core::Error::Config(msg),
            other => shipnote_core::Error::Messaging(other.to_string()),
        }
    }
}

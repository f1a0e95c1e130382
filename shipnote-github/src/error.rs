//! Error types for GitHub operations

use thiserror::Error;

/// Result type for GitHub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during GitHub operations
#[derive(Error, Debug)]
pub enum Error {
    /// GitHub API error
    #[error("GitHub API error: {0}")]
    Api(#[from] octocrab::Error),

    /// Authentication error
    #[error("GitHub authentication error: {0}")]
    Auth(String),

    /// Pull request not found
    #[error("Pull request #{0} not found")]
    PrNotFound(u64),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<Error> for shipnote_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Auth(msg) => shipnote_core::Error::Config(msg),
            other => shipnote_core::Error::CodeHost(other.to_string()),
        }
    }
}

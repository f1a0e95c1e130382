//! Error types for shipnote

use thiserror::Error;

/// Result type alias for shipnote operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for shipnote operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Code host (GitHub) call failed
    #[error("Code host error: {0}")]
    CodeHost(String),

    /// Task tracker (Asana) call failed
    #[error("Task tracker error: {0}")]
    Tracker(String),

    /// Messaging (Slack) call failed
    #[error("Messaging error: {0}")]
    Messaging(String),

    /// One or more task status updates failed and the caller asked for propagation
    #[error("Failed to update {failed} task(s): {ids}")]
    StatusUpdate {
        /// Number of failed updates
        failed: usize,
        /// Comma-separated task ids that failed
        ids: String,
    },
}

//! Shipnote Core - release notes and task status from pull requests
//!
//! This crate finds task links in PR descriptions, follows a release PR's
//! commit history to the PRs it ships, keeps task statuses in the tracker in
//! step with the target environment, and builds the release note posted to
//! Slack.

pub mod config;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod history;
pub mod notes;
pub mod pipeline;
pub mod ports;
pub mod secrets;
pub mod status;
pub mod thread;

#[cfg(test)]
pub(crate) mod testing;

use serde::{Deserialize, Serialize};

pub use config::Config;
pub use enrich::{TaskDetail, TaskEnricher, UNASSIGNED, UNKNOWN_TITLE};
pub use error::{Error, Result};
pub use extract::{extract, Extraction, TaskReference, TASK_ID_NOT_FOUND};
pub use history::{ChildPrRef, CommitHistoryWalker, PrSummary};
pub use notes::{NotificationPayload, ReleaseHeader, ReleaseNoteAggregator};
pub use pipeline::{Collaborators, Pipeline, RunReport, Trigger};
pub use ports::{CodeHost, Comment, Commit, Messenger, PostedMessage, TaskTracker, TrackerTask};
pub use secrets::Secrets;
pub use status::{LifecycleState, StatusUpdater, UpdateOutcome};
pub use thread::ThreadStore;

/// How a batch reacts when one of its items fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the failure and carry on with the rest
    #[default]
    Isolate,
    /// Return the failure to the caller
    Propagate,
}

impl FailurePolicy {
    /// `Propagate` when `strict` is set, `Isolate` otherwise
    pub fn strict_if(strict: bool) -> Self {
        if strict {
            FailurePolicy::Propagate
        } else {
            FailurePolicy::Isolate
        }
    }
}

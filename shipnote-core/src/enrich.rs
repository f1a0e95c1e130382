//! Task metadata lookup with per-task failure isolation

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::extract::TaskReference;
use crate::ports::TaskTracker;

/// Title shown when the tracker could not provide one
pub const UNKNOWN_TITLE: &str = "unknown title";

/// Assignee shown when the tracker could not provide one
pub const UNASSIGNED: &str = "unassigned";

/// Display metadata for one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDetail {
    /// Tracker task id (may be the not-found sentinel)
    pub id: String,
    /// Task title, or [`UNKNOWN_TITLE`]
    pub title: String,
    /// Assignee name, or [`UNASSIGNED`]
    pub assignee: String,
}

impl TaskDetail {
    /// Detail with both sentinels, used when the lookup failed
    pub fn unknown(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: UNKNOWN_TITLE.to_string(),
            assignee: UNASSIGNED.to_string(),
        }
    }

    /// Whether the tracker supplied a real title
    pub fn is_known(&self) -> bool {
        self.title != UNKNOWN_TITLE
    }
}

/// Looks up task titles and assignees
pub struct TaskEnricher<'a> {
    tracker: &'a dyn TaskTracker,
}

impl<'a> TaskEnricher<'a> {
    /// Create an enricher over a tracker
    pub fn new(tracker: &'a dyn TaskTracker) -> Self {
        Self { tracker }
    }

    /// Fetch details for every reference, one output per input, same order
    ///
    /// Lookups run concurrently. A failed lookup only degrades its own entry.
    pub async fn enrich(&self, references: &[TaskReference]) -> Vec<TaskDetail> {
        join_all(references.iter().map(|r| self.enrich_one(r))).await
    }

    async fn enrich_one(&self, reference: &TaskReference) -> TaskDetail {
        if !reference.is_resolved() {
            debug!(url = %reference.source_url, "No task id in URL, skipping lookup");
            return TaskDetail::unknown(&reference.id);
        }

        let task = match self.tracker.get_task(&reference.id).await {
            Ok(task) => task,
            Err(e) => {
                warn!(task_id = %reference.id, error = %e, "Failed to fetch task details");
                return TaskDetail::unknown(&reference.id);
            }
        };

        let title = task.name.filter(|n| !n.trim().is_empty()).unwrap_or_else(|| {
            warn!(task_id = %reference.id, "Task has no name");
            UNKNOWN_TITLE.to_string()
        });

        TaskDetail {
            id: reference.id.clone(),
            title,
            assignee: task.assignee.unwrap_or_else(|| UNASSIGNED.to_string()),
        }
    }
}

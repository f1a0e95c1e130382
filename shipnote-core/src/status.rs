//! Task status transitions in the tracker

use std::fmt;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::TrackerConfig;
use crate::extract::extract;
use crate::ports::TaskTracker;
use crate::{Error, FailurePolicy, Result};

/// Where a task's code currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// PR opened against the development branch
    UnderReview,
    /// Merged into staging
    InStaging,
    /// Shipped to production
    InProduction,
}

impl LifecycleState {
    /// Short name, as used on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::UnderReview => "review",
            LifecycleState::InStaging => "staging",
            LifecycleState::InProduction => "production",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LifecycleState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "review" | "under_review" => Ok(LifecycleState::UnderReview),
            "staging" | "in_staging" => Ok(LifecycleState::InStaging),
            "production" | "prod" | "in_production" => Ok(LifecycleState::InProduction),
            other => Err(Error::Config(format!("Unknown lifecycle state: {}", other))),
        }
    }
}

/// Outcome of a batch update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Task ids updated successfully
    pub updated: Vec<String>,
    /// Task ids that failed, with the error message
    pub failed: Vec<(String, String)>,
}

impl UpdateOutcome {
    /// Whether every update went through
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    fn into_result(self) -> Result<Self> {
        if self.failed.is_empty() {
            return Ok(self);
        }
        let ids: Vec<&str> = self.failed.iter().map(|(id, _)| id.as_str()).collect();
        Err(Error::StatusUpdate {
            failed: self.failed.len(),
            ids: ids.join(", "),
        })
    }
}

/// Writes the lifecycle status custom field on tasks
pub struct StatusUpdater<'a> {
    tracker: &'a dyn TaskTracker,
    config: &'a TrackerConfig,
}

impl<'a> StatusUpdater<'a> {
    /// Create an updater using the configured field and status codes
    pub fn new(tracker: &'a dyn TaskTracker, config: &'a TrackerConfig) -> Self {
        Self { tracker, config }
    }

    /// Move one task to `state`
    pub async fn apply(&self, task_id: &str, state: LifecycleState) -> Result<()> {
        let code = self.config.status_codes.code_for(state);
        debug!(task_id, %state, code, "Updating task status");

        self.tracker
            .set_custom_field(task_id, &self.config.status_field, code)
            .await
    }

    /// Move many tasks to `state` concurrently
    ///
    /// Every update is isolated: failures are logged and collected, never
    /// returned as an error.
    pub async fn apply_all(&self, task_ids: &[String], state: LifecycleState) -> UpdateOutcome {
        let results = join_all(task_ids.iter().map(|id| async move {
            let result = self.apply(id, state).await;
            (id, result)
        }))
        .await;

        let mut outcome = UpdateOutcome::default();
        for (id, result) in results {
            match result {
                Ok(()) => outcome.updated.push(id.clone()),
                Err(e) => {
                    warn!(task_id = %id, %state, error = %e, "Failed to update task status");
                    outcome.failed.push((id.clone(), e.to_string()));
                }
            }
        }

        info!(
            %state,
            updated = outcome.updated.len(),
            failed = outcome.failed.len(),
            "Applied status updates"
        );
        outcome
    }

    /// Update every task referenced by one PR description
    ///
    /// With [`FailurePolicy::Propagate`] a failed update becomes an error;
    /// with [`FailurePolicy::Isolate`] it is only logged.
    pub async fn update_from_description(
        &self,
        description: &str,
        state: LifecycleState,
        policy: FailurePolicy,
    ) -> Result<UpdateOutcome> {
        let ids = extract(description).resolved_ids();
        if ids.is_empty() {
            info!("No task references found in PR description, nothing to update");
            return Ok(UpdateOutcome::default());
        }

        let outcome = self.apply_all(&ids, state).await;
        match policy {
            FailurePolicy::Isolate => Ok(outcome),
            FailurePolicy::Propagate => outcome.into_result(),
        }
    }

    /// Update every task referenced by any of the descriptions, isolating failures
    pub async fn update_from_descriptions<'d, I>(
        &self,
        descriptions: I,
        state: LifecycleState,
    ) -> UpdateOutcome
    where
        I: IntoIterator<Item = &'d str>,
    {
        let ids: Vec<String> = descriptions
            .into_iter()
            .flat_map(|d| extract(d).resolved_ids())
            .collect();

        if ids.is_empty() {
            info!("No task references found in release descriptions");
            return UpdateOutcome::default();
        }

        self.apply_all(&ids, state).await
    }
}

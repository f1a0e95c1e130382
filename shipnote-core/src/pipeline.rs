//! Release pipeline: branches on the target environment and runs the steps
//!
//! - review / staging: move the PR's own tasks to the matching status
//! - production: walk the release PR's commits to find child PRs, move their
//!   tasks to production once merged, and post release notes to Slack

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::Config;
use crate::history::{CommitHistoryWalker, PrSummary};
use crate::notes::{post_release_notes, ReleaseHeader, ReleaseNoteAggregator};
use crate::ports::{CodeHost, Messenger, PostedMessage, TaskTracker};
use crate::status::{LifecycleState, StatusUpdater, UpdateOutcome};
use crate::thread::ThreadStore;
use crate::Result;

/// The pull request event a run was triggered by
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// PR number
    pub pr_number: u64,
    /// PR body
    pub description: String,
    /// Branch the PR targets
    pub base_branch: String,
    /// Whether the PR has been merged
    pub merged: bool,
}

#[derive(Debug, Deserialize)]
struct EventPayload {
    pull_request: Option<EventPullRequest>,
    repository: Option<EventRepository>,
}

#[derive(Debug, Deserialize)]
struct EventPullRequest {
    number: u64,
    body: Option<String>,
    #[serde(default)]
    merged: bool,
    base: EventBase,
}

#[derive(Debug, Deserialize)]
struct EventBase {
    #[serde(rename = "ref")]
    ref_field: String,
}

#[derive(Debug, Deserialize)]
struct EventRepository {
    name: String,
    owner: EventOwner,
}

#[derive(Debug, Deserialize)]
struct EventOwner {
    login: String,
}

impl Trigger {
    /// Parse a GitHub Actions `pull_request` event payload
    ///
    /// Returns `None` for events without a pull request.
    pub fn from_event_json(json: &str) -> Result<Option<Self>> {
        let event: EventPayload = serde_json::from_str(json)?;

        let Some(pr) = event.pull_request else {
            return Ok(None);
        };
        let (owner, repo) = event
            .repository
            .map(|r| (r.owner.login, r.name))
            .unwrap_or_default();

        Ok(Some(Self {
            owner,
            repo,
            pr_number: pr.number,
            description: pr.body.unwrap_or_default(),
            base_branch: pr.base.ref_field,
            merged: pr.merged,
        }))
    }
}

/// The external services a run talks to, constructed once per process
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    /// Source of commits, PR descriptions and hidden comments
    pub code_host: &'a dyn CodeHost,
    /// Task lookups and status field writes
    pub tracker: &'a dyn TaskTracker,
    /// Release note delivery
    pub messenger: &'a dyn Messenger,
}

/// What a run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Lifecycle state the target branch mapped to, if any
    pub state: Option<LifecycleState>,
    /// Child PRs found for a production release
    pub child_prs: Vec<u64>,
    /// Status update results
    pub updates: UpdateOutcome,
    /// The posted release note, if one was sent
    pub notes: Option<PostedMessage>,
}

/// Runs the release steps for one trigger
pub struct Pipeline<'a> {
    deps: Collaborators<'a>,
    config: &'a Config,
}

impl<'a> Pipeline<'a> {
    pub fn new(deps: Collaborators<'a>, config: &'a Config) -> Self {
        Self { deps, config }
    }

    /// Run for a trigger; `state` overrides the branch mapping
    pub async fn run(&self, trigger: &Trigger, state: Option<LifecycleState>) -> Result<RunReport> {
        let Some(state) = state.or_else(|| self.config.branches.resolve(&trigger.base_branch))
        else {
            info!(branch = %trigger.base_branch, "Target branch is not tracked, nothing to do");
            return Ok(RunReport::default());
        };

        info!(
            pr_number = trigger.pr_number,
            branch = %trigger.base_branch,
            %state,
            merged = trigger.merged,
            "Running release pipeline"
        );

        match state {
            LifecycleState::UnderReview | LifecycleState::InStaging => {
                self.run_single(trigger, state).await
            }
            LifecycleState::InProduction => self.run_release(trigger).await,
        }
    }

    async fn run_single(&self, trigger: &Trigger, state: LifecycleState) -> Result<RunReport> {
        let updates = StatusUpdater::new(self.deps.tracker, &self.config.tracker)
            .update_from_description(
                &trigger.description,
                state,
                self.config.policy.status_updates(),
            )
            .await?;

        Ok(RunReport {
            state: Some(state),
            updates,
            ..Default::default()
        })
    }

    async fn run_release(&self, trigger: &Trigger) -> Result<RunReport> {
        let summaries = CommitHistoryWalker::new(self.deps.code_host)
            .with_page_size(self.config.github.page_size)
            .with_child_fetch_policy(self.config.policy.child_fetch())
            .child_summaries(trigger.pr_number)
            .await?;

        let (updates, notes) = futures::join!(
            self.update_released_tasks(trigger, &summaries),
            self.send_notes(trigger, &summaries)
        );

        Ok(RunReport {
            state: Some(LifecycleState::InProduction),
            child_prs: summaries.iter().map(|s| s.pr_number).collect(),
            updates,
            notes: notes?,
        })
    }

    async fn update_released_tasks(
        &self,
        trigger: &Trigger,
        summaries: &[PrSummary],
    ) -> UpdateOutcome {
        if !trigger.merged {
            return UpdateOutcome::default();
        }

        StatusUpdater::new(self.deps.tracker, &self.config.tracker)
            .update_from_descriptions(
                summaries.iter().map(|s| s.description.as_str()),
                LifecycleState::InProduction,
            )
            .await
    }

    async fn send_notes(
        &self,
        trigger: &Trigger,
        summaries: &[PrSummary],
    ) -> Result<Option<PostedMessage>> {
        let slack = &self.config.slack;
        let Some(channel_id) = slack.channel_id.as_deref() else {
            warn!("No Slack channel configured, skipping release notes");
            return Ok(None);
        };

        let header = ReleaseHeader {
            owner: trigger.owner.clone(),
            repo: trigger.repo.clone(),
            pr_number: trigger.pr_number,
            environment: trigger.base_branch.clone(),
            audience_tag: slack.audience_tag.clone(),
        };

        let payload = ReleaseNoteAggregator::new(self.deps.tracker)
            .build(summaries, header, trigger.merged)
            .await;

        let store =
            ThreadStore::new(self.deps.code_host).with_page_size(self.config.github.page_size);
        let posted = post_release_notes(
            &store,
            self.deps.messenger,
            channel_id,
            &slack.thread_key,
            &payload,
        )
        .await?;

        Ok(Some(posted))
    }
}

//! Release note aggregation and threaded dispatch

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::enrich::TaskEnricher;
use crate::extract::extract;
use crate::history::PrSummary;
use crate::ports::{Messenger, PostedMessage, TaskTracker};
use crate::thread::ThreadStore;
use crate::Result;

/// Shown instead of the task list when no PR referenced a task
pub const NO_TASKS_FALLBACK: &str = "No task references found in the provided descriptions.";

/// One task line in a release note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEntry {
    /// Task title (or the unknown-title sentinel)
    pub title: String,
    /// Link to the task
    pub url: String,
    /// Feature flags declared by the PR that referenced the task
    pub flags: Vec<String>,
}

impl NoteEntry {
    /// Render as a Slack mrkdwn bullet
    pub fn render(&self) -> String {
        let mut line = format!("• <{}|{}>", self.url, self.title);
        if !self.flags.is_empty() {
            line.push_str(" with flags: ");
            line.push_str(&self.flags.join(", "));
        }
        line
    }
}

/// Where a release note is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseHeader {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// The triggering (release) PR
    pub pr_number: u64,
    /// Target branch / environment name
    pub environment: String,
    /// Audience context line, e.g. a Slack user group mention
    pub audience_tag: String,
}

impl ReleaseHeader {
    /// Slack link back to the triggering PR
    pub fn pr_link(&self) -> String {
        format!(
            "<https://github.com/{}/{}/pull/{}|#{}>",
            self.owner, self.repo, self.pr_number, self.pr_number
        )
    }
}

/// Everything needed to render one release notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// Header fields
    pub header: ReleaseHeader,
    /// Whether the release is being deployed (as opposed to prepared)
    pub is_deploy_notice: bool,
    /// Task entries pooled across all PRs, in input order
    pub entries: Vec<NoteEntry>,
}

impl NotificationPayload {
    /// First line of the note
    pub fn headline(&self) -> &'static str {
        if self.is_deploy_notice {
            "A new release is being *deployed 🚀*"
        } else {
            "A new release is being *cooked 👩‍🍳*"
        }
    }

    /// Rendered task lines, or the fallback line when there are none
    pub fn task_lines(&self) -> String {
        if self.entries.is_empty() {
            return NO_TASKS_FALLBACK.to_string();
        }
        self.entries
            .iter()
            .map(NoteEntry::render)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whole note as plain mrkdwn text
    pub fn to_text(&self) -> String {
        format!(
            "{}\n*Repository:* {}\n*PR:* {}\n*Env:* {}\n{}\n{}",
            self.headline(),
            self.header.repo,
            self.header.pr_link(),
            self.header.environment,
            self.task_lines(),
            self.header.audience_tag
        )
    }
}

/// Builds release notes from PR descriptions
pub struct ReleaseNoteAggregator<'a> {
    enricher: TaskEnricher<'a>,
}

impl<'a> ReleaseNoteAggregator<'a> {
    /// Create an aggregator that looks up task titles in `tracker`
    pub fn new(tracker: &'a dyn TaskTracker) -> Self {
        Self {
            enricher: TaskEnricher::new(tracker),
        }
    }

    /// Build a payload from every summary's task references
    ///
    /// Summaries are processed concurrently; entries keep input order and are
    /// not grouped by PR.
    pub async fn build(
        &self,
        summaries: &[PrSummary],
        header: ReleaseHeader,
        is_deploy_notice: bool,
    ) -> NotificationPayload {
        debug!(prs = summaries.len(), "Building release notes");

        let per_pr = join_all(summaries.iter().map(|s| self.entries_for(s))).await;
        let entries: Vec<NoteEntry> = per_pr.into_iter().flatten().collect();

        info!(
            prs = summaries.len(),
            tasks = entries.len(),
            is_deploy_notice,
            "Built release notes"
        );

        NotificationPayload {
            header,
            is_deploy_notice,
            entries,
        }
    }

    async fn entries_for(&self, summary: &PrSummary) -> Vec<NoteEntry> {
        let extraction = extract(&summary.description);
        if extraction.references.is_empty() {
            debug!(pr_number = summary.pr_number, "PR references no tasks");
            return Vec::new();
        }

        let details = self.enricher.enrich(&extraction.references).await;

        extraction
            .references
            .into_iter()
            .zip(details)
            .map(|(reference, detail)| NoteEntry {
                title: detail.title,
                url: reference.source_url,
                flags: extraction.flags.clone(),
            })
            .collect()
    }
}

/// Post a payload into the PR's thread, creating the thread on first use
///
/// The thread id is looked up in the PR's hidden comments. When none exists,
/// the posted message becomes the thread and its id is stored for later runs.
pub async fn post_release_notes(
    store: &ThreadStore<'_>,
    messenger: &dyn Messenger,
    channel_id: &str,
    thread_key: &str,
    payload: &NotificationPayload,
) -> Result<PostedMessage> {
    let pr_number = payload.header.pr_number;
    let existing = store.find(pr_number, thread_key).await?;

    let posted = messenger
        .post_message(channel_id, payload, existing.as_deref())
        .await?;

    match existing {
        Some(thread_id) => {
            info!(pr_number, %thread_id, "Replied in existing release thread");
        }
        None => {
            store.store(pr_number, thread_key, &posted.id).await?;
            info!(pr_number, thread_id = %posted.id, "Started new release thread");
        }
    }

    Ok(posted)
}

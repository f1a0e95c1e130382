//! Pull request and commit access

use crate::{Error, GitHubClient, Result};
use octocrab::models::pulls::PullRequest as OctocrabPR;
use octocrab::models::repos::RepoCommit;
use serde::{Deserialize, Serialize};
use shipnote_core::Commit;
use tracing::debug;

/// Pull request fields the pipeline reads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// PR body
    pub body: String,
}

impl From<OctocrabPR> for PullRequest {
    fn from(pr: OctocrabPR) -> Self {
        PullRequest {
            number: pr.number,
            body: pr.body.unwrap_or_default(),
        }
    }
}

/// Largest `per_page` GitHub honors
pub(crate) const MAX_PER_PAGE: u8 = 100;

/// Clamp a requested page size to what GitHub serves
pub(crate) fn clamp_per_page(requested: u8) -> u8 {
    requested.clamp(1, MAX_PER_PAGE)
}

fn to_commit(item: RepoCommit) -> Commit {
    Commit::new(item.sha, item.commit.message)
}

impl GitHubClient {
    /// Get a pull request by number
    pub async fn get_pr(&self, number: u64) -> Result<PullRequest> {
        debug!(number, "Fetching pull request");

        let pr = self
            .client()
            .pulls(self.owner(), self.repo())
            .get(number)
            .await
            .map_err(|e| match &e {
                octocrab::Error::GitHub { source, .. }
                    if source.message.contains("Not Found") =>
                {
                    Error::PrNotFound(number)
                }
                _ => Error::Api(e),
            })?;

        Ok(pr.into())
    }

    /// List one page of a pull request's commits, oldest first
    pub async fn list_pr_commits(&self, number: u64, page: u32, per_page: u8) -> Result<Vec<Commit>> {
        debug!(number, page, per_page, "Listing pull request commits");

        let commits = self
            .client()
            .pulls(self.owner(), self.repo())
            .pr_commits(number)
            .per_page(clamp_per_page(per_page))
            .page(page)
            .send()
            .await
            .map_err(Error::Api)?;

        Ok(commits.items.into_iter().map(to_commit).collect())
    }
}

//! Pull request conversation comments

use crate::pr::clamp_per_page;
use crate::{Error, GitHubClient, Result};
use octocrab::models::issues::Comment as OctocrabComment;
use shipnote_core::Comment;
use tracing::debug;

fn to_comment(comment: OctocrabComment) -> Comment {
    Comment {
        id: comment.id.into_inner(),
        body: comment.body.unwrap_or_default(),
    }
}

impl GitHubClient {
    /// List one page of a pull request's conversation comments, oldest first
    pub async fn list_pr_comments(
        &self,
        number: u64,
        page: u32,
        per_page: u8,
    ) -> Result<Vec<Comment>> {
        debug!(number, page, per_page, "Listing pull request comments");

        let comments = self
            .client()
            .issues(self.owner(), self.repo())
            .list_comments(number)
            .per_page(clamp_per_page(per_page))
            .page(page)
            .send()
            .await
            .map_err(Error::Api)?;

        Ok(comments.items.into_iter().map(to_comment).collect())
    }

    /// Add a conversation comment to a pull request
    pub async fn create_pr_comment(&self, number: u64, body: &str) -> Result<()> {
        debug!(number, "Creating pull request comment");

        self.client()
            .issues(self.owner(), self.repo())
            .create_comment(number, body)
            .await
            .map_err(Error::Api)?;

        Ok(())
    }
}

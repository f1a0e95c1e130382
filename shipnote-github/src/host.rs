//! [`CodeHost`] implementation backed by the GitHub REST API

use async_trait::async_trait;
use shipnote_core::{CodeHost, Comment, Commit};

use crate::GitHubClient;

#[async_trait]
impl CodeHost for GitHubClient {
    async fn list_commits(
        &self,
        pr_number: u64,
        page: u32,
        per_page: u8,
    ) -> shipnote_core::Result<Vec<Commit>> {
        Ok(self.list_pr_commits(pr_number, page, per_page).await?)
    }

    async fn pr_description(&self, pr_number: u64) -> shipnote_core::Result<String> {
        Ok(self.get_pr(pr_number).await?.body)
    }

    async fn list_comments(
        &self,
        pr_number: u64,
        page: u32,
        per_page: u8,
    ) -> shipnote_core::Result<Vec<Comment>> {
        Ok(self.list_pr_comments(pr_number, page, per_page).await?)
    }

    async fn create_comment(&self, pr_number: u64, body: &str) -> shipnote_core::Result<()> {
        Ok(self.create_pr_comment(pr_number, body).await?)
    }
}

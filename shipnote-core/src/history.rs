//! Commit history walking for release pull requests
//!
//! A release PR (e.g. `main` → `prod`) folds in many merged PRs. They are
//! discovered from the release PR's commit messages:
//! - merge commits: `Merge pull request #123 from owner/branch`
//! - squash commits: `Add login page (#123)`

use std::future::Future;
use std::sync::LazyLock;

use futures::future::join_all;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ports::{CodeHost, Commit};
use crate::{FailurePolicy, Result};

/// Page size used for all paginated listings unless configured otherwise
pub const DEFAULT_PAGE_SIZE: u8 = 100;

/// Largest page GitHub serves; bigger requests are silently capped
pub const MAX_PAGE_SIZE: u8 = 100;

static MERGE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^merge pull request").expect("MERGE_PREFIX regex should compile")
});

static HASH_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\d+)").expect("HASH_NUMBER regex should compile"));

static PAREN_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(#(\d+)\)").expect("PAREN_NUMBER regex should compile"));

/// A PR referenced from a release PR's commit history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildPrRef {
    /// The child PR number
    pub number: u64,
    /// Commit message the number was parsed from
    pub source_commit_message: String,
}

/// A PR number together with its description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrSummary {
    /// PR number
    pub pr_number: u64,
    /// PR body
    pub description: String,
}

impl PrSummary {
    /// Create a summary
    pub fn new(pr_number: u64, description: impl Into<String>) -> Self {
        Self {
            pr_number,
            description: description.into(),
        }
    }
}

/// Fetch every page of a listing
///
/// Pages are requested from 1 until a page comes back shorter than
/// `page_size`, which is clamped to `1..=MAX_PAGE_SIZE` so that a page the
/// host capped is never mistaken for the last one.
pub async fn collect_pages<T, F, Fut>(page_size: u8, mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(u32, u8) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
    let mut all = Vec::new();

    let mut page = 1u32;
    loop {
        let items = fetch_page(page, page_size).await?;
        let len = items.len();
        all.extend(items);

        if len < usize::from(page_size) {
            break;
        }
        page += 1;
    }

    Ok(all)
}

/// Parse the child PR number out of one commit message
pub fn child_pr_number(message: &str) -> Option<u64> {
    let caps = if MERGE_PREFIX.is_match(message) {
        HASH_NUMBER.captures(message)
    } else {
        PAREN_NUMBER.captures(message)
    }?;

    caps.get(1)?.as_str().parse().ok()
}

/// Derive child PRs from commits, in commit order
///
/// A PR referenced by more than one commit (a squash commit and a later merge
/// commit, say) is reported once, at its first occurrence, so its tasks are
/// updated and listed once per release.
pub fn derive_child_prs(commits: &[Commit]) -> Vec<ChildPrRef> {
    let mut children: Vec<ChildPrRef> = Vec::new();

    for commit in commits {
        let Some(number) = child_pr_number(&commit.message) else {
            continue;
        };
        if children.iter().any(|c| c.number == number) {
            continue;
        }
        children.push(ChildPrRef {
            number,
            source_commit_message: commit.message.clone(),
        });
    }

    children
}

/// Derive child PR numbers from commits, in commit order
pub fn derive_child_pr_numbers(commits: &[Commit]) -> Vec<u64> {
    derive_child_prs(commits)
        .into_iter()
        .map(|c| c.number)
        .collect()
}

/// Walks a release PR's commits to find the PRs it ships
pub struct CommitHistoryWalker<'a> {
    host: &'a dyn CodeHost,
    page_size: u8,
    child_fetch: FailurePolicy,
}

impl<'a> CommitHistoryWalker<'a> {
    /// Create a walker with the default page size that skips unreadable children
    pub fn new(host: &'a dyn CodeHost) -> Self {
        Self {
            host,
            page_size: DEFAULT_PAGE_SIZE,
            child_fetch: FailurePolicy::Isolate,
        }
    }

    /// Set the page size used when listing commits
    pub fn with_page_size(mut self, page_size: u8) -> Self {
        self.page_size = page_size;
        self
    }

    /// Choose whether one failing child PR fetch aborts the whole batch
    pub fn with_child_fetch_policy(mut self, policy: FailurePolicy) -> Self {
        self.child_fetch = policy;
        self
    }

    /// List every commit of a PR, following pagination
    pub async fn list_all_commits(&self, pr_number: u64) -> Result<Vec<Commit>> {
        debug!(pr_number, page_size = self.page_size, "Listing all commits");

        let commits = collect_pages(self.page_size, |page, per_page| {
            self.host.list_commits(pr_number, page, per_page)
        })
        .await?;

        info!(pr_number, count = commits.len(), "Fetched commits");
        Ok(commits)
    }

    /// Discover the child PRs of a release PR and fetch their descriptions
    ///
    /// The release PR itself is never reported as its own child.
    pub async fn child_summaries(&self, pr_number: u64) -> Result<Vec<PrSummary>> {
        let commits = self.list_all_commits(pr_number).await?;

        let numbers: Vec<u64> = derive_child_pr_numbers(&commits)
            .into_iter()
            .filter(|&n| n != pr_number)
            .collect();

        info!(pr_number, children = ?numbers, "Found child PR numbers");

        if numbers.is_empty() {
            return Ok(Vec::new());
        }

        let fetches = numbers.iter().map(|&number| async move {
            let description = self.host.pr_description(number).await;
            (number, description)
        });

        let mut summaries = Vec::with_capacity(numbers.len());
        for (number, description) in join_all(fetches).await {
            match description {
                Ok(description) => summaries.push(PrSummary::new(number, description)),
                Err(e) if self.child_fetch == FailurePolicy::Propagate => return Err(e),
                Err(e) => {
                    warn!(pr_number = number, error = %e, "Failed to fetch child PR, skipping");
                }
            }
        }

        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeCodeHost;

    #[test]
    fn test_child_pr_number_conventions() {
        assert_eq!(child_pr_number("Merge pull request #12 from org/feature"), Some(12));
        assert_eq!(child_pr_number("MERGE PULL REQUEST #7"), Some(7));
        assert_eq!(child_pr_number("fix bug (#34)"), Some(34));
        assert_eq!(child_pr_number("Refs #99 without parens"), None);
        assert_eq!(child_pr_number("unrelated commit"), None);
    }

    #[test]
    fn test_merge_prefix_must_lead_the_message() {
        assert_eq!(child_pr_number("Revert \"Merge pull request #5\""), None);
        assert_eq!(child_pr_number("Revert \"Merge pull request #5\" (#6)"), Some(6));
    }

    #[test]
    fn test_derive_child_pr_numbers() {
        let commits = vec![
            Commit::new("a", "Merge pull request #12 from org/feature"),
            Commit::new("b", "fix bug (#34)"),
            Commit::new("c", "unrelated commit"),
        ];
        assert_eq!(derive_child_pr_numbers(&commits), vec![12, 34]);
    }

    #[test]
    fn test_repeated_child_pr_reported_once_at_first_occurrence() {
        let commits = vec![
            Commit::new("a", "squash (#3)"),
            Commit::new("b", "Merge pull request #3 from org/x"),
        ];
        let children = derive_child_prs(&commits);
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].source_commit_message, "squash (#3)");
    }

    #[tokio::test]
    async fn test_pagination_completeness() {
        let host = FakeCodeHost::new().with_commits(9, 250);

        for page_size in [100, 7, 0] {
            let walker = CommitHistoryWalker::new(&host).with_page_size(page_size);
            let commits = walker.list_all_commits(9).await.unwrap();
            assert_eq!(commits.len(), 250, "page size {}", page_size);
            assert_eq!(commits[249].sha, "sha-249");
        }
    }

    #[tokio::test]
    async fn test_oversized_page_size_against_capped_host() {
        for page_size in [101, 150, 255] {
            let host = FakeCodeHost::new().with_commits(1, 250).capped_at(100);
            let walker = CommitHistoryWalker::new(&host).with_page_size(page_size);

            let commits = walker.list_all_commits(1).await.unwrap();
            assert_eq!(commits.len(), 250, "page size {}", page_size);
            assert_eq!(host.commit_page_requests(), 3, "page size {}", page_size);
        }
    }

    #[tokio::test]
    async fn test_exact_multiple_of_page_size_stops_on_empty_page() {
        let host = FakeCodeHost::new().with_commits(1, 200);
        let walker = CommitHistoryWalker::new(&host);
        assert_eq!(walker.list_all_commits(1).await.unwrap().len(), 200);
        assert_eq!(host.commit_page_requests(), 3);
    }

    #[tokio::test]
    async fn test_child_summaries() {
        let host = FakeCodeHost::new()
            .with_commit_messages(
                100,
                &[
                    "Merge pull request #12 from org/a",
                    "Release (#100)",
                    "tweak (#34)",
                    "wip",
                ],
            )
            .with_pr(12, "first")
            .with_pr(34, "second");

        let summaries = CommitHistoryWalker::new(&host).child_summaries(100).await.unwrap();
        assert_eq!(
            summaries,
            vec![PrSummary::new(12, "first"), PrSummary::new(34, "second")]
        );
    }

    #[tokio::test]
    async fn test_child_fetch_failure_isolated_by_default() {
        let host = FakeCodeHost::new()
            .with_commit_messages(1, &["a (#2)", "b (#3)", "c (#4)"])
            .with_pr(2, "two")
            .with_pr(4, "four");

        let summaries = CommitHistoryWalker::new(&host).child_summaries(1).await.unwrap();
        let numbers: Vec<u64> = summaries.iter().map(|s| s.pr_number).collect();
        assert_eq!(numbers, vec![2, 4]);
    }

    #[tokio::test]
    async fn test_child_fetch_failure_propagates_when_strict() {
        let host = FakeCodeHost::new()
            .with_commit_messages(1, &["a (#2)", "b (#3)"])
            .with_pr(2, "two");

        let result = CommitHistoryWalker::new(&host)
            .with_child_fetch_policy(FailurePolicy::Propagate)
            .child_summaries(1)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_commit_listing_failure_is_surfaced() {
        let host = FakeCodeHost::new().failing_commits();
        assert!(CommitHistoryWalker::new(&host).child_summaries(1).await.is_err());
    }
}

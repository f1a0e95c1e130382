//! Key/value state hidden in PR comments
//!
//! CI runs are stateless, but a release PR should keep posting into the same
//! Slack thread. The thread id is kept in a comment on the PR:
//!
//! ```text
//! <!-- store-data: key=slack-thread-id, value=1700000000.000100 -->
//! ```
//!
//! Nothing is escaped. Keys and values must not contain `-->`; a value that
//! does is cut short at the first `-->` when read back.

use tracing::{debug, info};

use crate::history::{collect_pages, DEFAULT_PAGE_SIZE};
use crate::ports::CodeHost;
use crate::Result;

const MARKER_OPEN: &str = "<!-- store-data: key=";
const MARKER_VALUE: &str = ", value=";
const MARKER_CLOSE: &str = "-->";

/// Encode a key/value pair as a hidden comment body
pub fn encode_marker(key: &str, value: &str) -> String {
    format!("{MARKER_OPEN}{key}{MARKER_VALUE}{value} {MARKER_CLOSE}")
}

/// Read the value stored under `key` in a comment body
///
/// Returns `None` when the marker is missing, unterminated or empty.
pub fn decode_marker(body: &str, key: &str) -> Option<String> {
    let prefix = format!("{MARKER_OPEN}{key}{MARKER_VALUE}");
    let start = body.find(&prefix)? + prefix.len();
    let rest = &body[start..];
    let end = rest.find(MARKER_CLOSE)?;

    let value = rest[..end].strip_suffix(' ').unwrap_or(&rest[..end]);
    if value.is_empty() {
        return None;
    }
    Some(value.to_string())
}

/// Stores and finds values in hidden PR comments
pub struct ThreadStore<'a> {
    host: &'a dyn CodeHost,
    page_size: u8,
}

impl<'a> ThreadStore<'a> {
    /// Create a store over a code host
    pub fn new(host: &'a dyn CodeHost) -> Self {
        Self {
            host,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set the page size used when scanning comments
    pub fn with_page_size(mut self, page_size: u8) -> Self {
        self.page_size = page_size;
        self
    }

    /// Find the value stored under `key` on a PR
    ///
    /// Scans every comment; the oldest matching marker wins.
    pub async fn find(&self, pr_number: u64, key: &str) -> Result<Option<String>> {
        let comments = collect_pages(self.page_size, |page, per_page| {
            self.host.list_comments(pr_number, page, per_page)
        })
        .await?;

        let value = comments.iter().find_map(|c| decode_marker(&c.body, key));

        debug!(
            pr_number,
            key,
            comments = comments.len(),
            found = value.is_some(),
            "Scanned comments for stored data"
        );
        Ok(value)
    }

    /// Append a comment holding `key = value`
    ///
    /// Always creates a new comment; call [`ThreadStore::find`] first to avoid
    /// duplicates.
    pub async fn store(&self, pr_number: u64, key: &str, value: &str) -> Result<()> {
        self.host
            .create_comment(pr_number, &encode_marker(key, value))
            .await?;

        info!(pr_number, key, value, "Stored data in hidden PR comment");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeCodeHost;

    const KEY: &str = "slack-thread-id";

    #[test]
    fn test_marker_format() {
        assert_eq!(
            encode_marker(KEY, "1700000000.000100"),
            "<!-- store-data: key=slack-thread-id, value=1700000000.000100 -->"
        );
    }

    #[test]
    fn test_decode_marker() {
        let body = encode_marker(KEY, "1700000000.000100");
        assert_eq!(decode_marker(&body, KEY).as_deref(), Some("1700000000.000100"));
        assert_eq!(decode_marker(&body, "other-key"), None);
    }

    #[test]
    fn test_decode_marker_inside_larger_body() {
        let body = "Deployed!\n<!-- store-data: key=k, value=v 1 -->\ntrailing text";
        assert_eq!(decode_marker(body, "k").as_deref(), Some("v 1"));
    }

    #[test]
    fn test_malformed_markers_are_absent() {
        assert_eq!(decode_marker("<!-- store-data: key=k, value=abc", "k"), None);
        assert_eq!(decode_marker("<!-- store-data: key=k, value= -->", "k"), None);
        assert_eq!(decode_marker("<!-- store-data: key=k value=abc -->", "k"), None);
    }

    #[test]
    fn test_value_with_closing_token_is_truncated() {
        let body = encode_marker("k", "a-->b");
        assert_eq!(decode_marker(&body, "k").as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_find_store_find() {
        let host = FakeCodeHost::new().with_comments(7, &["LGTM"]);
        let store = ThreadStore::new(&host);

        assert_eq!(store.find(7, KEY).await.unwrap(), None);
        store.store(7, KEY, "111.222").await.unwrap();
        assert_eq!(store.find(7, KEY).await.unwrap().as_deref(), Some("111.222"));
    }

    #[tokio::test]
    async fn test_first_marker_wins() {
        let first = encode_marker(KEY, "old");
        let second = encode_marker(KEY, "new");
        let host = FakeCodeHost::new().with_comments(3, &[&first, &second]);

        let value = ThreadStore::new(&host).find(3, KEY).await.unwrap();
        assert_eq!(value.as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn test_find_scans_past_first_page() {
        let filler: Vec<String> = (0..120).map(|i| format!("comment {}", i)).collect();
        let mut bodies: Vec<&str> = filler.iter().map(String::as_str).collect();
        let marker = encode_marker(KEY, "999.1");
        bodies.push(&marker);
        let host = FakeCodeHost::new().with_comments(5, &bodies);

        let value = ThreadStore::new(&host).find(5, KEY).await.unwrap();
        assert_eq!(value.as_deref(), Some("999.1"));
        assert_eq!(host.comment_page_requests(), 2);
    }

    #[tokio::test]
    async fn test_find_with_oversized_page_size_against_capped_host() {
        let filler: Vec<String> = (0..150).map(|i| format!("comment {}", i)).collect();
        let mut bodies: Vec<&str> = filler.iter().map(String::as_str).collect();
        let marker = encode_marker(KEY, "999.2");
        bodies.push(&marker);
        let host = FakeCodeHost::new().with_comments(5, &bodies).capped_at(100);

        let value = ThreadStore::new(&host)
            .with_page_size(200)
            .find(5, KEY)
            .await
            .unwrap();
        assert_eq!(value.as_deref(), Some("999.2"));
        assert_eq!(host.comment_page_requests(), 2);
    }

    #[tokio::test]
    async fn test_comment_listing_failure_is_surfaced() {
        let host = FakeCodeHost::new().failing_comments();
        assert!(ThreadStore::new(&host).find(1, KEY).await.is_err());
    }
}

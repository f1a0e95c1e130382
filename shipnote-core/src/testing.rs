//! In-memory collaborators for tests

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::notes::NotificationPayload;
use crate::ports::{CodeHost, Comment, Commit, Messenger, PostedMessage, TaskTracker, TrackerTask};
use crate::{Error, Result};

/// Code host backed by maps; comments can be appended
#[derive(Debug, Default)]
pub struct FakeCodeHost {
    commits: HashMap<u64, Vec<Commit>>,
    descriptions: HashMap<u64, String>,
    comments: Mutex<HashMap<u64, Vec<Comment>>>,
    fail_commits: bool,
    fail_comments: bool,
    max_per_page: Option<u8>,
    commit_pages: AtomicUsize,
    comment_pages: AtomicUsize,
    created: AtomicUsize,
}

impl FakeCodeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// `count` generic commits on `pr_number`
    pub fn with_commits(mut self, pr_number: u64, count: usize) -> Self {
        let commits = (0..count)
            .map(|i| Commit::new(format!("sha-{}", i), format!("commit {}", i)))
            .collect();
        self.commits.insert(pr_number, commits);
        self
    }

    pub fn with_commit_messages(mut self, pr_number: u64, messages: &[&str]) -> Self {
        let commits = messages
            .iter()
            .enumerate()
            .map(|(i, m)| Commit::new(format!("sha-{}", i), *m))
            .collect();
        self.commits.insert(pr_number, commits);
        self
    }

    pub fn with_pr(mut self, pr_number: u64, description: &str) -> Self {
        self.descriptions.insert(pr_number, description.to_string());
        self
    }

    pub fn with_comments(self, pr_number: u64, bodies: &[&str]) -> Self {
        {
            let mut comments = self.comments.lock().unwrap();
            let entry = comments.entry(pr_number).or_default();
            for body in bodies {
                let id = entry.len() as u64 + 1;
                entry.push(Comment {
                    id,
                    body: body.to_string(),
                });
            }
        }
        self
    }

    /// Serve at most `max` items per page, whatever `per_page` asks for
    pub fn capped_at(mut self, max: u8) -> Self {
        self.max_per_page = Some(max);
        self
    }

    fn serve<T: Clone>(&self, items: &[T], page: u32, per_page: u8) -> Vec<T> {
        let per_page = self.max_per_page.map_or(per_page, |max| per_page.min(max));
        page_of(items, page, per_page)
    }

    pub fn failing_commits(mut self) -> Self {
        self.fail_commits = true;
        self
    }

    pub fn failing_comments(mut self) -> Self {
        self.fail_comments = true;
        self
    }

    pub fn commit_page_requests(&self) -> usize {
        self.commit_pages.load(Ordering::SeqCst)
    }

    pub fn comment_page_requests(&self) -> usize {
        self.comment_pages.load(Ordering::SeqCst)
    }

    /// Number of comments created through the port
    pub fn created_comments(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn comment_bodies(&self, pr_number: u64) -> Vec<String> {
        self.comments
            .lock()
            .unwrap()
            .get(&pr_number)
            .map(|c| c.iter().map(|c| c.body.clone()).collect())
            .unwrap_or_default()
    }
}

fn page_of<T: Clone>(items: &[T], page: u32, per_page: u8) -> Vec<T> {
    let per_page = usize::from(per_page);
    let start = (page as usize - 1) * per_page;
    items.iter().skip(start).take(per_page).cloned().collect()
}

#[async_trait]
impl CodeHost for FakeCodeHost {
    async fn list_commits(&self, pr_number: u64, page: u32, per_page: u8) -> Result<Vec<Commit>> {
        self.commit_pages.fetch_add(1, Ordering::SeqCst);
        if self.fail_commits {
            return Err(Error::CodeHost("commit listing unavailable".to_string()));
        }
        let commits = self.commits.get(&pr_number).cloned().unwrap_or_default();
        Ok(self.serve(&commits, page, per_page))
    }

    async fn pr_description(&self, pr_number: u64) -> Result<String> {
        self.descriptions
            .get(&pr_number)
            .cloned()
            .ok_or_else(|| Error::CodeHost(format!("Pull request #{} not found", pr_number)))
    }

    async fn list_comments(
        &self,
        pr_number: u64,
        page: u32,
        per_page: u8,
    ) -> Result<Vec<Comment>> {
        self.comment_pages.fetch_add(1, Ordering::SeqCst);
        if self.fail_comments {
            return Err(Error::CodeHost("comment listing unavailable".to_string()));
        }
        let comments = self
            .comments
            .lock()
            .unwrap()
            .get(&pr_number)
            .cloned()
            .unwrap_or_default();
        Ok(self.serve(&comments, page, per_page))
    }

    async fn create_comment(&self, pr_number: u64, body: &str) -> Result<()> {
        self.created.fetch_add(1, Ordering::SeqCst);
        let mut comments = self.comments.lock().unwrap();
        let entry = comments.entry(pr_number).or_default();
        let id = entry.len() as u64 + 1;
        entry.push(Comment {
            id,
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Task tracker backed by a map; selected tasks fail every call
#[derive(Debug, Default)]
pub struct FakeTracker {
    tasks: HashMap<String, TrackerTask>,
    failing: HashSet<String>,
    updates: Mutex<Vec<(String, String, String)>>,
}

impl FakeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_task(mut self, id: &str, name: &str, assignee: Option<&str>) -> Self {
        self.tasks.insert(
            id.to_string(),
            TrackerTask {
                name: Some(name.to_string()),
                assignee: assignee.map(str::to_string),
            },
        );
        self
    }

    pub fn with_raw_task(mut self, id: &str, task: TrackerTask) -> Self {
        self.tasks.insert(id.to_string(), task);
        self
    }

    pub fn failing(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    /// Recorded `(task_id, field_key, value)` updates
    pub fn updates(&self) -> Vec<(String, String, String)> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskTracker for FakeTracker {
    async fn get_task(&self, task_id: &str) -> Result<TrackerTask> {
        if self.failing.contains(task_id) {
            return Err(Error::Tracker(format!("task {} unavailable", task_id)));
        }
        self.tasks
            .get(task_id)
            .cloned()
            .ok_or_else(|| Error::Tracker(format!("task {} not found", task_id)))
    }

    async fn set_custom_field(&self, task_id: &str, field_key: &str, value: &str) -> Result<()> {
        if self.failing.contains(task_id) {
            return Err(Error::Tracker(format!("task {} rejected update", task_id)));
        }
        self.updates.lock().unwrap().push((
            task_id.to_string(),
            field_key.to_string(),
            value.to_string(),
        ));
        Ok(())
    }
}

/// A message captured by [`FakeMessenger`]
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub channel_id: String,
    pub thread_id: Option<String>,
    pub payload: NotificationPayload,
}

/// Messenger that records posts and hands out sequential ids
#[derive(Debug, Default)]
pub struct FakeMessenger {
    sent: Mutex<Vec<SentMessage>>,
    fail: bool,
}

impl FakeMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for FakeMessenger {
    async fn post_message(
        &self,
        channel_id: &str,
        payload: &NotificationPayload,
        thread_id: Option<&str>,
    ) -> Result<PostedMessage> {
        if self.fail {
            return Err(Error::Messaging("channel_not_found".to_string()));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(SentMessage {
            channel_id: channel_id.to_string(),
            thread_id: thread_id.map(str::to_string),
            payload: payload.clone(),
        });
        Ok(PostedMessage {
            id: format!("1700000000.{:06}", sent.len()),
        })
    }
}

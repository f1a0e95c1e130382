//! Shipnote GitHub - GitHub integration for shipnote
//!
//! This crate provides the pull request, commit and comment access the
//! release pipeline needs, implementing [`shipnote_core::CodeHost`].

mod client;
mod comments;
mod error;
mod host;
mod pr;

pub use client::{parse_github_url, GitHubClient};
pub use error::{Error, Result};
pub use pr::PullRequest;

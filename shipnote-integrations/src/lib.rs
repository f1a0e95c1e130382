//! Shipnote Integrations - task tracker and messaging clients
//!
//! [`AsanaClient`] implements [`shipnote_core::TaskTracker`] and
//! [`SlackClient`] implements [`shipnote_core::Messenger`], both over reqwest.

mod asana;
mod error;
mod http;
mod slack;

pub use asana::AsanaClient;
pub use error::{Error, Result};
pub use http::build_http_client;
pub use slack::{render_blocks, SlackClient};

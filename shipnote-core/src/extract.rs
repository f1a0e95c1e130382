//! Task reference and feature flag extraction from PR descriptions
//!
//! Task links have changed shape over the years, so every URL on the tracker
//! host is matched against the known shapes in order:
//!
//! 1. `https://app.asana.com/1/<ws>/project/<p>/task/<id>` (`/task/<digits>` suffix)
//! 2. `https://app.asana.com/0/<project>/<id>` (optionally followed by `/f`)
//! 3. any URL ending in a numeric segment, optionally followed by `/f`
//!
//! Feature flags are declared as `[FeatureFlags](flag_a, flag_b)`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Sentinel id for a tracker URL that did not yield a numeric task id
pub const TASK_ID_NOT_FOUND: &str = "not-found";

static TASK_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://app\.asana\.com/[^\s<>()\[\]|"'`]*"#)
        .expect("TASK_URL regex should compile")
});

static TASK_SUFFIX_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/task/(\d+)(?:/f)?/?$").expect("TASK_SUFFIX_SHAPE regex should compile")
});

static PROJECT_TASK_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/0/\d+/(\d+)(?:/f)?/?$").expect("PROJECT_TASK_SHAPE regex should compile")
});

static TRAILING_ID_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(\d+)(?:/f)?/?$").expect("TRAILING_ID_SHAPE regex should compile")
});

static FEATURE_FLAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[FeatureFlags\]\s*\(([^)]*)\)").expect("FEATURE_FLAGS regex should compile")
});

/// A task link found in free text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskReference {
    /// Tracker task id, or [`TASK_ID_NOT_FOUND`]
    pub id: String,
    /// The URL the id was recovered from
    pub source_url: String,
}

impl TaskReference {
    /// Whether the id is usable as a tracker key
    pub fn is_resolved(&self) -> bool {
        self.id != TASK_ID_NOT_FOUND
    }
}

/// Everything recovered from one description
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    /// Task references in order of appearance
    pub references: Vec<TaskReference>,
    /// Normalized feature flags, deduplicated, first-seen order
    pub flags: Vec<String>,
}

impl Extraction {
    /// Ids of the references that resolved to a real task id
    pub fn resolved_ids(&self) -> Vec<String> {
        resolved_ids(&self.references)
    }
}

/// Extract task references and feature flags from a description
///
/// Never fails: text without matches yields empty lists.
pub fn extract(text: &str) -> Extraction {
    Extraction {
        references: extract_references(text),
        flags: extract_feature_flags(text),
    }
}

/// Extract all task references, in order of appearance
pub fn extract_references(text: &str) -> Vec<TaskReference> {
    let references: Vec<TaskReference> = TASK_URL
        .find_iter(text)
        .map(|m| trim_trailing_punctuation(m.as_str()))
        .filter(|url| !url.is_empty())
        .map(|url| TaskReference {
            id: task_id_from_url(url).unwrap_or_else(|| TASK_ID_NOT_FOUND.to_string()),
            source_url: url.to_string(),
        })
        .collect();

    if references.is_empty() {
        debug!("No task references found in description");
    }

    references
}

/// Keep only the ids of references that resolved
pub fn resolved_ids(references: &[TaskReference]) -> Vec<String> {
    references
        .iter()
        .filter(|r| r.is_resolved())
        .map(|r| r.id.clone())
        .collect()
}

/// Recover the task id from a tracker URL, trying each known shape in order
fn task_id_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);

    [&*TASK_SUFFIX_SHAPE, &*PROJECT_TASK_SHAPE, &*TRAILING_ID_SHAPE]
        .iter()
        .find_map(|shape| shape.captures(path))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Drop sentence punctuation that the URL pattern swallowed
fn trim_trailing_punctuation(url: &str) -> &str {
    url.trim_end_matches(['.', ',', ';', ':', '!', '?'])
}

/// Extract `[FeatureFlags](...)` entries as one normalized set
pub fn extract_feature_flags(text: &str) -> Vec<String> {
    let mut flags: Vec<String> = Vec::new();

    for caps in FEATURE_FLAGS.captures_iter(text) {
        let Some(list) = caps.get(1) else { continue };
        for flag in list.as_str().split(',') {
            let flag = flag.trim().to_lowercase();
            if !flag.is_empty() && !flags.contains(&flag) {
                flags.push(flag);
            }
        }
    }

    if flags.is_empty() {
        debug!("Feature flags not found in description");
    }

    flags
}

//! Notify command - run the release pipeline for a pull request event

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use shipnote_core::{Collaborators, Config, LifecycleState, Pipeline, RunReport, Secrets, Trigger};
use shipnote_github::{parse_github_url, GitHubClient};
use shipnote_integrations::{build_http_client, AsanaClient, SlackClient};
use tracing::{info, warn};

/// Arguments for the notify command
#[derive(Args, Debug)]
pub struct NotifyArgs {
    /// Path to the GitHub event payload
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    pub event_path: PathBuf,

    /// Repository as owner/repo (defaults to the one in the event payload)
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: Option<String>,

    /// Lifecycle state to apply instead of mapping the target branch
    /// (review, staging, production)
    #[arg(long)]
    pub state: Option<LifecycleState>,
}

impl NotifyArgs {
    /// Execute the notify command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let Some(trigger) = self.load_trigger()? else {
            info!(path = %self.event_path.display(), "Event has no pull request, nothing to do");
            return Ok(());
        };

        let secrets = Secrets::load()?;
        let github = GitHubClient::from_secrets(&trigger.owner, &trigger.repo, &secrets)?;
        let http = build_http_client(config.http.timeout)?;
        let asana = AsanaClient::from_secrets(http.clone(), &config.tracker.base_url, &secrets)?;
        let slack = match SlackClient::from_secrets(http.clone(), &config.slack.base_url, &secrets) {
            Ok(slack) => slack,
            Err(e) if config.slack.channel_id.is_some() => return Err(e.into()),
            Err(_) => {
                // Never called: notes are skipped when no channel is configured
                SlackClient::new(http, &config.slack.base_url, String::new())
            }
        };

        let deps = Collaborators {
            code_host: &github,
            tracker: &asana,
            messenger: &slack,
        };
        let report = Pipeline::new(deps, config).run(&trigger, self.state).await?;

        print_report(&trigger, &report);
        Ok(())
    }

    fn load_trigger(&self) -> anyhow::Result<Option<Trigger>> {
        let Some(mut trigger) = read_trigger(&self.event_path)? else {
            return Ok(None);
        };

        if let Some(repository) = &self.repository {
            let (owner, repo) = parse_github_url(repository)?;
            trigger.owner = owner;
            trigger.repo = repo;
        }

        if trigger.owner.is_empty() || trigger.repo.is_empty() {
            anyhow::bail!("Repository unknown: pass --repository or set GITHUB_REPOSITORY");
        }

        Ok(Some(trigger))
    }
}

fn read_trigger(path: &Path) -> anyhow::Result<Option<Trigger>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read event payload {}", path.display()))?;
    Ok(Trigger::from_event_json(&json)?)
}

fn print_report(trigger: &Trigger, report: &RunReport) {
    let Some(state) = report.state else {
        println!(
            "PR #{} targets '{}', which is not tracked. Nothing to do.",
            trigger.pr_number, trigger.base_branch
        );
        return;
    };

    println!("PR #{} → {}", trigger.pr_number, state);
    if !report.child_prs.is_empty() {
        let children: Vec<String> = report.child_prs.iter().map(|n| format!("#{}", n)).collect();
        println!("  Released PRs: {}", children.join(", "));
    }
    println!("  Tasks updated: {}", report.updates.updated.len());
    for (id, error) in &report.updates.failed {
        warn!(task_id = %id, error = %error, "Task status not updated");
    }
    if !report.updates.failed.is_empty() {
        println!("  Tasks failed: {}", report.updates.failed.len());
    }
    if let Some(posted) = &report.notes {
        println!("  Release notes posted (ts {})", posted.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn event_file(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", json).unwrap();
        file
    }

    fn args(path: &Path, repository: Option<&str>) -> NotifyArgs {
        NotifyArgs {
            event_path: path.to_path_buf(),
            repository: repository.map(str::to_string),
            state: None,
        }
    }

    #[test]
    fn test_repository_flag_overrides_event() {
        let file = event_file(
            r#"{"pull_request": {"number": 3, "body": "b", "base": {"ref": "main"}},
                "repository": {"name": "old", "owner": {"login": "someone"}}}"#,
        );

        let trigger = args(file.path(), Some("acme/shop"))
            .load_trigger()
            .unwrap()
            .unwrap();
        assert_eq!((trigger.owner.as_str(), trigger.repo.as_str()), ("acme", "shop"));
        assert!(!trigger.merged);
    }

    #[test]
    fn test_missing_repository_is_an_error() {
        let file = event_file(r#"{"pull_request": {"number": 3, "base": {"ref": "main"}}}"#);
        assert!(args(file.path(), None).load_trigger().is_err());
    }

    #[test]
    fn test_non_pr_event() {
        let file = event_file(r#"{"ref": "refs/heads/main"}"#);
        assert!(args(file.path(), None).load_trigger().unwrap().is_none());
    }

    #[test]
    fn test_unreadable_event_path() {
        let err = args(Path::new("/nonexistent/event.json"), None)
            .load_trigger()
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read event payload"));
    }
}

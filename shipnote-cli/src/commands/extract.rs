//! Extract command - show what a PR description references

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use shipnote_core::{extract, Extraction};

/// Arguments for the extract command
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// File holding the description (reads stdin when omitted)
    pub file: Option<PathBuf>,
}

impl ExtractArgs {
    /// Execute the extract command
    pub fn execute(&self) -> anyhow::Result<()> {
        let description = match &self.file {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
            None => {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("Failed to read description from stdin")?;
                buf
            }
        };

        print!("{}", render(&extract(&description)));
        Ok(())
    }
}

fn render(extraction: &Extraction) -> String {
    let mut out = String::new();

    if extraction.references.is_empty() {
        out.push_str("No task references found.\n");
    } else {
        out.push_str(&format!("Task references ({}):\n", extraction.references.len()));
        for reference in &extraction.references {
            out.push_str(&format!("  {}  {}\n", reference.id, reference.source_url));
        }
    }

    if !extraction.flags.is_empty() {
        out.push_str(&format!("Feature flags: {}\n", extraction.flags.join(", ")));
    }

    out
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Console listing

use super::Reporter;
use crate::types::{RepoState, Repository};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::io::{self, Stdout, Write};

/// Prints one line per repository, or a JSON array
pub struct ConsoleReporter<W = Stdout> {
    out: W,
    json: bool,
    color: bool,
}

impl ConsoleReporter<Stdout> {
    /// Report to standard output
    #[must_use]
    pub fn stdout(json: bool, color: bool) -> Self {
        Self::new(io::stdout(), json, color)
    }
}

impl<W: Write> ConsoleReporter<W> {
    /// Report to an arbitrary writer
    pub fn new(out: W, json: bool, color: bool) -> Self {
        Self { out, json, color }
    }

    /// Take back the underlying writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn state_label(&self, repo: &Repository) -> String {
        let label = match repo.state {
            RepoState::Unknown => "status:unknown".to_string(),
            _ => format!("synced:{}", repo.synced),
        };
        if !self.color {
            return label;
        }
        match repo.state {
            RepoState::Synced => label.green().to_string(),
            RepoState::Dirty => label.yellow().to_string(),
            RepoState::Unknown => label.red().to_string(),
        }
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn name(&self) -> &'static str {
        "console"
    }

    fn report(&mut self, repos: &[Repository]) -> Result<()> {
        if self.json {
            serde_json::to_writer_pretty(&mut self.out, repos)
                .context("Failed to serialize repositories")?;
            writeln!(self.out)?;
        } else {
            for repo in repos {
                let state = self.state_label(repo);
                writeln!(
                    self.out,
                    "{}; modified:{}; added:{}; deleted:{}; {}",
                    repo.path.display(),
                    repo.modified,
                    repo.added,
                    repo.deleted,
                    state
                )?;
            }
        }
        self.out.flush().context("Failed to flush console output")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StatusCounts;
    use std::path::PathBuf;

    fn sample() -> Vec<Repository> {
        vec![
            Repository::new(
                PathBuf::from("/src/dirty"),
                StatusCounts { added: 1, modified: 2, deleted: 3 },
            ),
            Repository::new(PathBuf::from("/src/clean"), StatusCounts::default()),
            Repository::unknown(PathBuf::from("/src/broken")),
        ]
    }

    fn render(json: bool) -> String {
        let mut reporter = ConsoleReporter::new(Vec::new(), json, false);
        reporter.report(&sample()).unwrap();
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn prints_one_line_per_repository() {
        assert_eq!(
            render(false),
            "/src/dirty; modified:2; added:1; deleted:3; synced:false\n\
             /src/clean; modified:0; added:0; deleted:0; synced:true\n\
             /src/broken; modified:0; added:0; deleted:0; status:unknown\n"
        );
    }

    #[test]
    fn json_output_round_trips() {
        let parsed: Vec<Repository> = serde_json::from_str(&render(true)).unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn json_marks_unknown_state() {
        let value: serde_json::Value = serde_json::from_str(&render(true)).unwrap();
        assert_eq!(value[2]["state"], "unknown");
        assert_eq!(value[1]["synced"], true);
    }
}

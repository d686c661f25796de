// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Delimited text export

use super::Reporter;
use crate::types::Repository;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Field separator, padded with one space on each side when written
pub const SEPARATOR: &str = ",";

/// Writes a header and one row per repository, replacing the file each time
pub struct DelimitedReporter {
    path: PathBuf,
}

impl DelimitedReporter {
    /// Export to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Destination file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn synced_field(repo: &Repository) -> String {
    if repo.is_unknown() {
        "unknown".to_string()
    } else {
        repo.synced.to_string()
    }
}

/// Render repositories in the export format
pub fn write_delimited<W: Write>(out: &mut W, repos: &[Repository]) -> std::io::Result<()> {
    let sep = SEPARATOR;
    writeln!(out, "path {sep} added {sep} deleted {sep} modified {sep} synced")?;
    for repo in repos {
        writeln!(
            out,
            "{} {sep} {} {sep} {} {sep} {} {sep} {}",
            repo.path.display(),
            repo.added,
            repo.deleted,
            repo.modified,
            synced_field(repo)
        )?;
    }
    Ok(())
}

impl Reporter for DelimitedReporter {
    fn name(&self) -> &'static str {
        "file"
    }

    fn report(&mut self, repos: &[Repository]) -> Result<()> {
        let file = File::create(&self.path)
            .with_context(|| format!("Failed to create {}", self.path.display()))?;
        let mut out = BufWriter::new(file);
        write_delimited(&mut out, repos)
            .and_then(|()| out.flush())
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        debug!("Wrote {} rows to {}", repos.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StatusCounts;
    use tempfile::TempDir;

    fn sample() -> Vec<Repository> {
        vec![
            Repository::new(PathBuf::from("/src/clean"), StatusCounts::default()),
            Repository::new(
                PathBuf::from("/src/dirty"),
                StatusCounts { added: 4, modified: 2, deleted: 1 },
            ),
        ]
    }

    #[test]
    fn writes_header_and_rows_in_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("repos.csv");
        let mut reporter = DelimitedReporter::new(&path);

        reporter.report(&sample()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "path , added , deleted , modified , synced",
                "/src/clean , 0 , 0 , 0 , true",
                "/src/dirty , 4 , 1 , 2 , false",
            ]
        );
    }

    #[test]
    fn rewrites_file_on_every_report() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("repos.csv");
        let mut reporter = DelimitedReporter::new(&path);

        reporter.report(&sample()).unwrap();
        reporter.report(&sample()[..1]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn unknown_status_is_spelled_out() {
        let mut out = Vec::new();
        write_delimited(&mut out, &[Repository::unknown(PathBuf::from("/src/x"))]).unwrap();
        assert!(String::from_utf8(out).unwrap().ends_with("/src/x , 0 , 0 , 0 , unknown\n"));
    }

    #[test]
    fn unwritable_destination_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let mut reporter = DelimitedReporter::new(tmp.path().join("missing/dir/repos.csv"));
        assert!(reporter.report(&sample()).is_err());
    }
}

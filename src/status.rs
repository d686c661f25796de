// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Working-tree status analysis
//!
//! Runs `git status --porcelain` for a repository and classifies the output
//! into added, modified and deleted counts. Two classifiers are available:
//! a per-line parse of the two-character status code, and the legacy
//! whole-output pattern search kept for dashboards that depend on its counts.

use crate::types::StatusCounts;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

lazy_static! {
    static ref BLOB_MODIFIED: Regex =
        Regex::new(r" M|U [0-9A-Za-z_]*").expect("BLOB_MODIFIED regex is valid");
    static ref BLOB_ADDED: Regex =
        Regex::new(r"\?\? [0-9A-Za-z_]*").expect("BLOB_ADDED regex is valid");
    static ref BLOB_DELETED: Regex =
        Regex::new(r" ?D [0-9A-Za-z_]*").expect("BLOB_DELETED regex is valid");
}

/// Errors running the status query
#[derive(Debug, Error)]
pub enum StatusError {
    /// git could not be started
    #[error("failed to run git in {path}: {source}")]
    Spawn {
        /// Working directory queried
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
    /// git ran but reported an error
    #[error("git status failed in {path} ({status}): {stderr}")]
    Failed {
        /// Working directory queried
        path: PathBuf,
        /// Exit status description
        status: String,
        /// Trimmed stderr output
        stderr: String,
    },
}

/// How porcelain output is turned into counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ClassifyMode {
    /// Parse the `XY` status code of each line
    #[default]
    Porcelain,
    /// Count pattern matches over the whole output (legacy counts)
    Blob,
}

impl ClassifyMode {
    /// Classify a porcelain output blob
    #[must_use]
    pub fn classify(self, output: &str) -> StatusCounts {
        match self {
            Self::Porcelain => classify_porcelain(output),
            Self::Blob => classify_blob(output),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Added,
    Modified,
    Deleted,
}

fn classify_entry(x: u8, y: u8) -> Option<EntryKind> {
    const CHANGED: &[u8] = b"MTRC";

    match (x, y) {
        (b'!', b'!') => None,
        (b'?', b'?') => Some(EntryKind::Added),
        (b'D', b'D') | (b'A', b'A') => Some(EntryKind::Modified),
        _ if x == b'U' || y == b'U' => Some(EntryKind::Modified),
        _ if x == b'D' || y == b'D' => Some(EntryKind::Deleted),
        _ if x == b'A' || y == b'A' => Some(EntryKind::Added),
        _ if CHANGED.contains(&x) || CHANGED.contains(&y) => Some(EntryKind::Modified),
        _ => None,
    }
}

fn saturating_count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Count entries by their two-character porcelain status code.
///
/// Each line lands in at most one bucket. Unmerged entries count as
/// modified, ignored entries are skipped. An `A` in either column counts
/// as added, so intent-to-add entries (` A`) keep the tree dirty.
#[must_use]
pub fn classify_porcelain(output: &str) -> StatusCounts {
    let mut counts = StatusCounts::default();

    for line in output.lines() {
        let bytes = line.as_bytes();
        if bytes.len() < 2 {
            continue;
        }
        match classify_entry(bytes[0], bytes[1]) {
            Some(EntryKind::Added) => counts.added = counts.added.saturating_add(1),
            Some(EntryKind::Modified) => counts.modified = counts.modified.saturating_add(1),
            Some(EntryKind::Deleted) => counts.deleted = counts.deleted.saturating_add(1),
            None => {}
        }
    }

    counts
}

/// Count non-overlapping pattern matches over the whole output.
///
/// Matches are not anchored to lines, so file names containing status-like
/// sequences are counted too.
#[must_use]
pub fn classify_blob(output: &str) -> StatusCounts {
    StatusCounts {
        added: saturating_count(BLOB_ADDED.find_iter(output).count()),
        modified: saturating_count(BLOB_MODIFIED.find_iter(output).count()),
        deleted: saturating_count(BLOB_DELETED.find_iter(output).count()),
    }
}

// =============================================================================
// Running git
// =============================================================================

/// Source of `git status --porcelain` output
pub trait GitRunner {
    /// Return the porcelain status output for `work_dir`
    fn status_porcelain(&self, work_dir: &Path) -> Result<String, StatusError>;
}

impl<F> GitRunner for F
where
    F: Fn(&Path) -> Result<String, StatusError>,
{
    fn status_porcelain(&self, work_dir: &Path) -> Result<String, StatusError> {
        self(work_dir)
    }
}

/// Runs the `git` executable, passing the repository path with `-C`
#[derive(Debug, Clone)]
pub struct SystemGit {
    program: PathBuf,
}

impl Default for SystemGit {
    fn default() -> Self {
        Self { program: PathBuf::from("git") }
    }
}

impl SystemGit {
    /// Use a specific git executable
    #[must_use]
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }
}

impl GitRunner for SystemGit {
    fn status_porcelain(&self, work_dir: &Path) -> Result<String, StatusError> {
        let output = Command::new(&self.program)
            .arg("-C")
            .arg(work_dir)
            .args(["--no-optional-locks", "status", "--porcelain"])
            .output()
            .map_err(|source| StatusError::Spawn { path: work_dir.to_path_buf(), source })?;

        if !output.status.success() {
            return Err(StatusError::Failed {
                path: work_dir.to_path_buf(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Queries and classifies the status of working directories
#[derive(Debug, Clone, Default)]
pub struct StatusAnalyzer<G = SystemGit> {
    runner: G,
    mode: ClassifyMode,
}

impl<G: GitRunner> StatusAnalyzer<G> {
    /// Create an analyzer over a git runner
    pub fn new(runner: G, mode: ClassifyMode) -> Self {
        Self { runner, mode }
    }

    /// The classification mode in use
    pub fn mode(&self) -> ClassifyMode {
        self.mode
    }

    /// Count the uncommitted changes in `work_dir`
    pub fn analyze(&self, work_dir: &Path) -> Result<StatusCounts, StatusError> {
        let output = self.runner.status_porcelain(work_dir)?;
        Ok(self.mode.classify(&output))
    }
}

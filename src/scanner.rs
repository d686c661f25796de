// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Repository scanning

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Name of the directory that marks a repository root
pub const METADATA_DIR: &str = ".git";

/// Options controlling the directory walk
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Maximum depth below the root (0 = unlimited)
    pub max_depth: usize,
    /// Follow symbolic links while walking
    pub follow_symlinks: bool,
    /// Glob patterns for directory names that are pruned from the walk
    pub exclude: Vec<String>,
}

impl ScanConfig {
    fn exclude_set(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude {
            builder.add(
                Glob::new(pattern).with_context(|| format!("Invalid exclude pattern: {pattern}"))?,
            );
        }
        builder.build().context("Failed to build exclude patterns")
    }
}

/// Find every `.git` directory below `root`.
///
/// A `.git` directory is recorded and never descended into. Unreadable
/// subtrees are logged and skipped; they never abort the walk. The result is
/// in walk order, not sorted.
pub fn find_metadata_dirs(root: &Path, config: &ScanConfig) -> Result<Vec<PathBuf>> {
    let excluded = config.exclude_set()?;

    let mut walker = WalkDir::new(root).follow_links(config.follow_symlinks);
    if config.max_depth > 0 {
        walker = walker.max_depth(config.max_depth);
    }

    let mut found = Vec::new();
    let mut entries = walker.into_iter();

    while let Some(entry) = entries.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!("Skipping unreadable path: {}", err);
                continue;
            }
        };

        if !entry.file_type().is_dir() {
            continue;
        }

        if entry.file_name() == METADATA_DIR {
            debug!("Found repo: {}", entry.path().display());
            found.push(entry.into_path());
            entries.skip_current_dir();
            continue;
        }

        if entry.depth() > 0 && excluded.is_match(entry.file_name()) {
            debug!("Excluded: {}", entry.path().display());
            entries.skip_current_dir();
        }
    }

    debug!("Found {} candidate repositories under {}", found.len(), root.display());
    Ok(found)
}

/// Working directory for a metadata directory (the `.git` component stripped)
#[must_use]
pub fn working_dir(metadata_dir: &Path) -> PathBuf {
    match metadata_dir.file_name() {
        Some(name) if name == METADATA_DIR => metadata_dir
            .parent()
            .map_or_else(|| metadata_dir.to_path_buf(), Path::to_path_buf),
        _ => metadata_dir.to_path_buf(),
    }
}

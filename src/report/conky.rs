// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Conky feed - a generated shell script rendering one line per dirty repo

use super::Reporter;
use crate::types::Repository;
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

const HEADER: &str = "#!/bin/bash
#
# This file is automatically generated
# Must have DejaVu sans mono font installed
# assumes conky colors:
# color 1 : git additions
# color 2 : git deletions
# color 3 : git modifications
# color 4 : status unknown
#
";

const PREFIX_ADD: &str = "+";
const PREFIX_DEL: &str = "-";
const PREFIX_MOD: &str = "~";
const SEPARATOR: &str = " : ";
const PATH_FONT: &str = "${font DejaVu Sans Mono: size=12:style=book}";
const BLANK_SLOT: &str = "   ";

/// Permission bits of the generated script
#[cfg(unix)]
pub const FEED_MODE: u32 = 0o775;

/// Writes the conky feed script, replacing it on every report
pub struct ConkyReporter {
    path: PathBuf,
}

impl ConkyReporter {
    /// Write the feed to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Destination file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn push_slot(line: &mut String, color: u8, prefix: &str, count: u32) {
    if count == 0 {
        line.push_str(BLANK_SLOT);
    } else {
        let _ = write!(line, "${{color{color}}}{prefix}{count} ");
    }
}

fn shell_quote_body(text: &str) -> String {
    text.replace('\'', r"'\''")
}

/// Render the feed script. Synced repositories are skipped.
#[must_use]
pub fn render(repos: &[Repository]) -> String {
    let mut data = String::from(HEADER);

    for repo in repos {
        if repo.synced {
            debug!("Skipping synced repo: {}", repo.path.display());
            continue;
        }

        data.push_str("echo '${font}");
        if repo.is_unknown() {
            data.push_str("${color4}?  ");
            data.push_str(BLANK_SLOT);
            data.push_str(BLANK_SLOT);
        } else {
            push_slot(&mut data, 1, PREFIX_ADD, repo.added);
            push_slot(&mut data, 2, PREFIX_DEL, repo.deleted);
            push_slot(&mut data, 3, PREFIX_MOD, repo.modified);
        }
        let _ = writeln!(
            data,
            "${{color}}{SEPARATOR}{PATH_FONT}{}${{color}}${{font}}'",
            shell_quote_body(&repo.path.display().to_string())
        );
    }

    data
}

impl Reporter for ConkyReporter {
    fn name(&self) -> &'static str {
        "conky"
    }

    fn report(&mut self, repos: &[Repository]) -> Result<()> {
        let data = render(repos);

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(FEED_MODE);
        }

        let mut file = options
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        file.write_all(data.as_bytes())
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        // mode() only applies on creation
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(FEED_MODE))
                .with_context(|| format!("Failed to set permissions on {}", self.path.display()))?;
        }

        debug!("Wrote conky feed to {}", self.path.display());
        Ok(())
    }
}

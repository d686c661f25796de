// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Repoporter library - uncommitted-change reports for your local checkouts
//!
//! This crate walks a directory tree for git repositories owned by a given
//! forge user, counts the uncommitted changes in each working tree, and hands
//! the result to one or more reporters (console, delimited file, conky feed),
//! either once or on a fixed interval.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod commands;
pub mod config;
pub mod cycle;
pub mod owner;
pub mod report;
pub mod scanner;
pub mod status;

/// Core data types shared by every stage of a cycle
pub mod types {
    use serde::{Deserialize, Serialize};
    use std::path::PathBuf;

    // =========================================================================
    // Status Counts
    // =========================================================================

    /// Classified working-tree entries for one repository
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct StatusCounts {
        /// Untracked or newly staged entries
        pub added: u32,
        /// Modified, renamed, copied or unmerged entries
        pub modified: u32,
        /// Deleted entries
        pub deleted: u32,
    }

    impl StatusCounts {
        /// True when no entry of any kind was counted
        #[must_use]
        pub fn is_clean(&self) -> bool {
            self.added == 0 && self.modified == 0 && self.deleted == 0
        }
    }

    // =========================================================================
    // Repository
    // =========================================================================

    /// Working-tree state of a repository
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum RepoState {
        /// Nothing to commit
        Synced,
        /// At least one uncommitted change
        Dirty,
        /// The status query failed; counts are meaningless
        Unknown,
    }

    /// One matched repository and its uncommitted-change counts
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Repository {
        /// Absolute path of the working directory
        pub path: PathBuf,
        /// Added entries
        pub added: u32,
        /// Modified entries
        pub modified: u32,
        /// Deleted entries
        pub deleted: u32,
        /// True iff the status is known and every count is zero
        pub synced: bool,
        /// Synced, dirty or unknown
        pub state: RepoState,
    }

    impl Repository {
        /// Build a record from a successful status query
        #[must_use]
        pub fn new(path: PathBuf, counts: StatusCounts) -> Self {
            let synced = counts.is_clean();
            Self {
                path,
                added: counts.added,
                modified: counts.modified,
                deleted: counts.deleted,
                synced,
                state: if synced { RepoState::Synced } else { RepoState::Dirty },
            }
        }

        /// Build a record for a repository whose status could not be read
        #[must_use]
        pub fn unknown(path: PathBuf) -> Self {
            Self {
                path,
                added: 0,
                modified: 0,
                deleted: 0,
                synced: false,
                state: RepoState::Unknown,
            }
        }

        /// The counts carried by this record
        #[must_use]
        pub fn counts(&self) -> StatusCounts {
            StatusCounts {
                added: self.added,
                modified: self.modified,
                deleted: self.deleted,
            }
        }

        /// Whether the status query for this repository failed
        #[must_use]
        pub fn is_unknown(&self) -> bool {
            self.state == RepoState::Unknown
        }
    }

}

/// Prelude for common imports
pub mod prelude {
    pub use crate::types::*;
    pub use anyhow::{Context, Result};
}

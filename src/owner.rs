// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Ownership filtering against `.git/config`
//!
//! The check is a plain text search for a remote URL of the form
//! `url = https://<host>/<owner>` anywhere in the config file. It does not
//! parse remotes, so `alice` also matches `alicebob/...`.

use regex::Regex;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Forge host matched when none is configured
pub const DEFAULT_HOST: &str = "github.com";

/// Errors building an owner matcher
#[derive(Debug, Error)]
pub enum OwnerError {
    /// The owner identifier was empty
    #[error("owner identifier must not be empty")]
    EmptyOwner,
    /// The forge host was empty
    #[error("forge host must not be empty")]
    EmptyHost,
    /// The generated pattern failed to compile
    #[error("invalid owner pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Decides whether a repository belongs to an owner
#[derive(Debug, Clone)]
pub struct OwnerMatcher {
    owner: String,
    pattern: Regex,
}

impl OwnerMatcher {
    /// Build a matcher for `owner` on `host`
    pub fn new(owner: &str, host: &str) -> Result<Self, OwnerError> {
        if owner.is_empty() {
            return Err(OwnerError::EmptyOwner);
        }
        if host.is_empty() {
            return Err(OwnerError::EmptyHost);
        }

        let pattern = Regex::new(&format!(
            r"url\s*=\s*https?://{}/{}",
            regex::escape(host),
            regex::escape(owner)
        ))?;

        Ok(Self { owner: owner.to_string(), pattern })
    }

    /// The owner this matcher looks for
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Test raw config text for a matching remote URL
    #[must_use]
    pub fn matches_config(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    /// Read `<metadata_dir>/config` and test it.
    ///
    /// An unreadable config excludes the candidate.
    #[must_use]
    pub fn matches(&self, metadata_dir: &Path) -> bool {
        let config_path = metadata_dir.join("config");
        let text = match fs::read(&config_path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(err) => {
                warn!("Cannot read {}: {}", config_path.display(), err);
                return false;
            }
        };

        let matched = self.matches_config(&text);
        if !matched {
            debug!("Not owned by {}: {}", self.owner, metadata_dir.display());
        }
        matched
    }

    /// Keep only the candidates owned by this matcher's owner, in order
    #[must_use]
    pub fn filter<I, P>(&self, candidates: I) -> Vec<P>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        candidates
            .into_iter()
            .filter(|candidate| self.matches(candidate.as_ref()))
            .collect()
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `REPOPORTER_*` environment variables, then command-line flags.

use crate::cycle::CycleContext;
use crate::owner::{OwnerError, OwnerMatcher, DEFAULT_HOST};
use crate::scanner::ScanConfig;
use crate::status::{ClassifyMode, StatusAnalyzer, SystemGit};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Prefix of environment variables read as settings
pub const ENV_PREFIX: &str = "REPOPORTER";

/// Seconds between daemon cycles when not configured
pub const DEFAULT_TIMER_SECS: u64 = 10;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file or environment could not be read
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    /// No owner identifier was given
    #[error("missing owner argument (-o/--owner)")]
    MissingOwner,
    /// The owner matcher could not be built
    #[error(transparent)]
    Owner(#[from] OwnerError),
    /// No home directory to default or expand against
    #[error("cannot determine home directory")]
    NoHome,
    /// The scan root is missing or not a directory
    #[error("cannot scan {path}: {reason}")]
    BadRoot {
        /// Root as configured
        path: PathBuf,
        /// What went wrong
        reason: String,
    },
    /// A zero interval would spin
    #[error("timer must be at least 1 second in daemon mode")]
    InvalidTimer,
}

/// Raw settings as read from file, environment and flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory to scan (home directory when unset)
    pub path: Option<PathBuf>,
    /// Owner identifier matched against remote URLs
    pub owner: Option<String>,
    /// Forge host matched against remote URLs
    pub host: String,
    /// Repeat the scan on an interval
    pub daemon: bool,
    /// Seconds between daemon cycles
    pub timer: u64,
    /// Delimited export destination
    pub file: Option<PathBuf>,
    /// Conky feed destination
    pub conky: Option<PathBuf>,
    /// Status classification mode
    pub classify: ClassifyMode,
    /// Directory-name globs pruned from the scan
    pub exclude: Vec<String>,
    /// Maximum scan depth (0 = unlimited)
    pub max_depth: usize,
    /// Follow symbolic links while scanning
    pub follow_symlinks: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: None,
            owner: None,
            host: DEFAULT_HOST.to_string(),
            daemon: false,
            timer: DEFAULT_TIMER_SECS,
            file: None,
            conky: None,
            classify: ClassifyMode::default(),
            exclude: Vec::new(),
            max_depth: 0,
            follow_symlinks: false,
        }
    }
}

/// Values given on the command line; `None`/`false` leaves a setting alone
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// `--path`
    pub path: Option<PathBuf>,
    /// `--owner`
    pub owner: Option<String>,
    /// `--host`
    pub host: Option<String>,
    /// `--daemon`
    pub daemon: bool,
    /// `--timer`
    pub timer: Option<u64>,
    /// `--file`
    pub file: Option<PathBuf>,
    /// `--conky`
    pub conky: Option<PathBuf>,
    /// `--classify`
    pub classify: Option<ClassifyMode>,
    /// `--exclude` (appended)
    pub exclude: Vec<String>,
    /// `--max-depth`
    pub max_depth: Option<usize>,
    /// `--follow-symlinks`
    pub follow_symlinks: bool,
}

/// Default config file location
#[must_use]
pub fn default_config_file() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "hyperpolymath", "repoporter")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}

/// Expand a leading `~` against `home`
pub fn expand_home(path: &Path, home: Option<&Path>) -> Result<PathBuf, ConfigError> {
    match path.strip_prefix("~") {
        Ok(rest) => {
            let home = home.ok_or(ConfigError::NoHome)?;
            Ok(if rest.as_os_str().is_empty() { home.to_path_buf() } else { home.join(rest) })
        }
        Err(_) => Ok(path.to_path_buf()),
    }
}

impl Config {
    /// Load from `file` (or the default location) and the process environment
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let env = config::Environment::with_prefix(ENV_PREFIX);
        match file {
            Some(path) => Self::load_from(Some((path, true)), env),
            None => {
                let default = default_config_file();
                Self::load_from(default.as_deref().map(|p| (p, false)), env)
            }
        }
    }

    /// Load from an optional file (path, required) and an environment source
    pub fn load_from(
        file: Option<(&Path, bool)>,
        env: config::Environment,
    ) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        if let Some((path, required)) = file {
            builder = builder.add_source(config::File::from(path).required(required));
        }

        builder = builder.add_source(
            env.try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("exclude"),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Apply command-line values on top
    pub fn apply(&mut self, overrides: Overrides) {
        if overrides.path.is_some() {
            self.path = overrides.path;
        }
        if overrides.owner.is_some() {
            self.owner = overrides.owner;
        }
        if let Some(host) = overrides.host {
            self.host = host;
        }
        self.daemon |= overrides.daemon;
        if let Some(timer) = overrides.timer {
            self.timer = timer;
        }
        if overrides.file.is_some() {
            self.file = overrides.file;
        }
        if overrides.conky.is_some() {
            self.conky = overrides.conky;
        }
        if let Some(classify) = overrides.classify {
            self.classify = classify;
        }
        self.exclude.extend(overrides.exclude);
        if let Some(depth) = overrides.max_depth {
            self.max_depth = depth;
        }
        self.follow_symlinks |= overrides.follow_symlinks;
    }

    /// Validate and resolve paths against the user's home directory
    pub fn resolve(self) -> Result<Settings, ConfigError> {
        let home = home_dir();
        self.resolve_with_home(home.as_deref())
    }

    /// Validate and resolve paths against `home`
    pub fn resolve_with_home(self, home: Option<&Path>) -> Result<Settings, ConfigError> {
        let owner = self
            .owner
            .filter(|owner| !owner.is_empty())
            .ok_or(ConfigError::MissingOwner)?;

        if self.daemon && self.timer == 0 {
            return Err(ConfigError::InvalidTimer);
        }

        let root = match self.path {
            Some(path) => expand_home(&path, home)?,
            None => home.map(Path::to_path_buf).ok_or(ConfigError::NoHome)?,
        };
        let root = root.canonicalize().map_err(|err| ConfigError::BadRoot {
            path: root.clone(),
            reason: err.to_string(),
        })?;
        if !root.is_dir() {
            return Err(ConfigError::BadRoot { path: root, reason: "not a directory".into() });
        }

        let file = self.file.map(|p| expand_home(&p, home)).transpose()?;
        let conky = self.conky.map(|p| expand_home(&p, home)).transpose()?;

        Ok(Settings {
            root,
            owner,
            host: self.host,
            daemon: self.daemon,
            interval: Duration::from_secs(self.timer),
            file,
            conky,
            classify: self.classify,
            scan: ScanConfig {
                max_depth: self.max_depth,
                follow_symlinks: self.follow_symlinks,
                exclude: self.exclude,
            },
        })
    }
}

/// Validated settings for a run
#[derive(Debug, Clone)]
pub struct Settings {
    /// Absolute root directory
    pub root: PathBuf,
    /// Owner identifier
    pub owner: String,
    /// Forge host
    pub host: String,
    /// Repeating mode
    pub daemon: bool,
    /// Sleep between daemon cycles
    pub interval: Duration,
    /// Delimited export destination
    pub file: Option<PathBuf>,
    /// Conky feed destination
    pub conky: Option<PathBuf>,
    /// Status classification mode
    pub classify: ClassifyMode,
    /// Walk options
    pub scan: ScanConfig,
}

impl Settings {
    /// Build the pass context using the system `git`
    pub fn cycle_context(&self) -> Result<CycleContext<SystemGit>, ConfigError> {
        Ok(CycleContext {
            root: self.root.clone(),
            scan: self.scan.clone(),
            matcher: OwnerMatcher::new(&self.owner, &self.host)?,
            analyzer: StatusAnalyzer::new(SystemGit::default(), self.classify),
        })
    }
}

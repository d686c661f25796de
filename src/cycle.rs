// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Scan cycles - one-shot and repeating execution
//!
//! A pass scans the root, filters by owner, analyzes each match and builds a
//! fresh repository list. Nothing survives from one pass to the next.

use crate::owner::OwnerMatcher;
use crate::report::Reporter;
use crate::scanner::{find_metadata_dirs, working_dir, ScanConfig};
use crate::status::{GitRunner, StatusAnalyzer, SystemGit};
use crate::types::Repository;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Everything a pass needs, built once from configuration
pub struct CycleContext<G = SystemGit> {
    /// Directory to scan
    pub root: PathBuf,
    /// Walk options
    pub scan: ScanConfig,
    /// Ownership filter
    pub matcher: OwnerMatcher,
    /// Status query and classifier
    pub analyzer: StatusAnalyzer<G>,
}

/// The result of a single pass
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    /// Matched repositories in scan order
    pub repositories: Vec<Repository>,
    /// Number of `.git` directories found before filtering
    pub candidates: usize,
    /// When the pass began
    pub started_at: DateTime<Utc>,
    /// When the pass finished
    pub finished_at: DateTime<Utc>,
}

impl<G: GitRunner> CycleContext<G> {
    /// Run scan, filter and analysis once
    pub fn run_pass(&self) -> Result<CycleOutcome> {
        let started_at = Utc::now();

        let candidates = find_metadata_dirs(&self.root, &self.scan)
            .with_context(|| format!("Failed to scan {}", self.root.display()))?;
        let candidate_count = candidates.len();

        let matched = self.matcher.filter(candidates);
        debug!(
            "{} of {} candidates owned by {}",
            matched.len(),
            candidate_count,
            self.matcher.owner()
        );

        let repositories = matched.iter().map(|dir| self.build_record(dir)).collect();

        Ok(CycleOutcome {
            repositories,
            candidates: candidate_count,
            started_at,
            finished_at: Utc::now(),
        })
    }

    fn build_record(&self, metadata_dir: &Path) -> Repository {
        let work_dir = working_dir(metadata_dir);
        match self.analyzer.analyze(&work_dir) {
            Ok(counts) => Repository::new(work_dir, counts),
            Err(err) => {
                warn!("Status unknown: {}", err);
                Repository::unknown(work_dir)
            }
        }
    }
}

/// Create the cancellation channel for [`Poller::run`]
///
/// Sending `true` stops the loop before its next pass or during its sleep.
#[must_use]
pub fn shutdown_channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Runs passes and hands each result to the reporters
pub struct Poller<G = SystemGit> {
    context: CycleContext<G>,
    reporters: Vec<Box<dyn Reporter>>,
    interval: Duration,
}

impl<G: GitRunner> Poller<G> {
    /// Create a poller sleeping `interval` between passes
    pub fn new(context: CycleContext<G>, reporters: Vec<Box<dyn Reporter>>, interval: Duration) -> Self {
        Self { context, reporters, interval }
    }

    /// Run one pass and report it
    pub fn run_once(&mut self) -> Result<CycleOutcome> {
        let outcome = self.context.run_pass()?;

        for reporter in &mut self.reporters {
            reporter
                .report(&outcome.repositories)
                .with_context(|| format!("{} reporter failed", reporter.name()))?;
        }

        debug!(
            "Reported {} repositories ({} candidates) in {} ms",
            outcome.repositories.len(),
            outcome.candidates,
            (outcome.finished_at - outcome.started_at).num_milliseconds()
        );
        Ok(outcome)
    }

    /// Repeat passes until `shutdown` carries `true`.
    ///
    /// The interval is measured from the end of each pass. Returns the number
    /// of completed passes.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<u64> {
        let mut cycles = 0u64;

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.run_once()?;
            cycles += 1;

            if *shutdown.borrow() {
                break;
            }

            debug!("Sleeping {:?} before next pass", self.interval);
            let sleep = tokio::time::sleep(self.interval);
            tokio::pin!(sleep);

            let stopped = tokio::select! {
                () = &mut sleep => false,
                signal = shutdown.wait_for(|stop| *stop) => signal.is_ok(),
            };
            if stopped {
                break;
            }
            // Sender dropped: nobody can stop us early any more
            if !sleep.is_elapsed() {
                sleep.await;
            }
        }

        debug!("Stopped after {} cycles", cycles);
        Ok(cycles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::owner::DEFAULT_HOST;
    use crate::status::{ClassifyMode, StatusError};
    use crate::types::{RepoState, StatusCounts};
    use std::fs;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    type Seen = Arc<Mutex<Vec<Vec<Repository>>>>;
    type FakeGit = fn(&Path) -> Result<String, StatusError>;

    struct Recorder {
        seen: Seen,
        stop_after: Option<(usize, watch::Sender<bool>)>,
    }

    impl Reporter for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn report(&mut self, repos: &[Repository]) -> Result<()> {
            let mut seen = self.seen.lock().unwrap();
            seen.push(repos.to_vec());
            if let Some((limit, tx)) = &self.stop_after {
                if seen.len() >= *limit {
                    tx.send_replace(true);
                }
            }
            Ok(())
        }
    }

    struct Failing;

    impl Reporter for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn report(&mut self, _repos: &[Repository]) -> Result<()> {
            anyhow::bail!("disk full")
        }
    }

    fn boxed(reporter: impl Reporter + 'static) -> Vec<Box<dyn Reporter>> {
        vec![Box::new(reporter)]
    }

    fn add_repo(root: &Path, name: &str, owner: &str) -> PathBuf {
        let git_dir = root.join(name).join(".git");
        fs::create_dir_all(&git_dir).unwrap();
        fs::write(
            git_dir.join("config"),
            format!("[remote \"origin\"]\n\turl = https://github.com/{owner}/{name}.git\n"),
        )
        .unwrap();
        root.join(name)
    }

    fn fake_git(path: &Path) -> Result<String, StatusError> {
        match path.file_name().and_then(|n| n.to_str()) {
            Some("dirty") => Ok(" M file1\n?? file2\n D file3\n".into()),
            Some("broken") => Err(StatusError::Failed {
                path: path.to_path_buf(),
                status: "exit status: 128".into(),
                stderr: "fatal".into(),
            }),
            _ => Ok(String::new()),
        }
    }

    fn context(root: &Path, owner: &str) -> CycleContext<FakeGit> {
        CycleContext {
            root: root.to_path_buf(),
            scan: ScanConfig::default(),
            matcher: OwnerMatcher::new(owner, DEFAULT_HOST).unwrap(),
            analyzer: StatusAnalyzer::new(fake_git as FakeGit, ClassifyMode::Porcelain),
        }
    }

    fn sorted(mut repos: Vec<Repository>) -> Vec<Repository> {
        repos.sort_by(|a, b| a.path.cmp(&b.path));
        repos
    }

    #[test]
    fn pass_keeps_only_owned_repositories() {
        let tmp = TempDir::new().unwrap();
        let repo_a = add_repo(tmp.path(), "repoA", "alice");

        let alice = context(tmp.path(), "alice").run_pass().unwrap();
        assert_eq!(alice.candidates, 1);
        assert_eq!(alice.repositories.len(), 1);
        assert_eq!(alice.repositories[0].path, repo_a);

        let bob = context(tmp.path(), "bob").run_pass().unwrap();
        assert_eq!(bob.candidates, 1);
        assert!(bob.repositories.is_empty());
    }

    #[test]
    fn pass_builds_records_from_status() {
        let tmp = TempDir::new().unwrap();
        let clean = add_repo(tmp.path(), "clean", "alice");
        let dirty = add_repo(tmp.path(), "dirty", "alice");
        let broken = add_repo(tmp.path(), "broken", "alice");
        add_repo(tmp.path(), "theirs", "bob");

        let outcome = context(tmp.path(), "alice").run_pass().unwrap();
        let repos = sorted(outcome.repositories);

        assert_eq!(outcome.candidates, 4);
        assert_eq!(
            repos,
            sorted(vec![
                Repository::unknown(broken),
                Repository::new(clean, StatusCounts::default()),
                Repository::new(dirty, StatusCounts { added: 1, modified: 1, deleted: 1 }),
            ])
        );
    }

    #[test]
    fn synced_matches_counts_for_known_records() {
        let tmp = TempDir::new().unwrap();
        for name in ["clean", "dirty", "broken", "other"] {
            add_repo(tmp.path(), name, "alice");
        }

        let outcome = context(tmp.path(), "alice").run_pass().unwrap();

        for repo in outcome.repositories {
            if repo.state == RepoState::Unknown {
                assert!(!repo.synced);
            } else {
                assert_eq!(repo.synced, repo.added == 0 && repo.modified == 0 && repo.deleted == 0);
            }
        }
    }

    #[test]
    fn repeated_passes_are_identical() {
        let tmp = TempDir::new().unwrap();
        add_repo(tmp.path(), "clean", "alice");
        add_repo(tmp.path(), "dirty", "alice");

        let ctx = context(tmp.path(), "alice");
        let first = ctx.run_pass().unwrap();
        let second = ctx.run_pass().unwrap();

        assert_eq!(first.repositories, second.repositories);
    }

    #[test]
    fn run_once_hands_list_to_every_reporter() {
        let tmp = TempDir::new().unwrap();
        add_repo(tmp.path(), "dirty", "alice");

        let seen_a: Seen = Arc::default();
        let seen_b: Seen = Arc::default();
        let reporters: Vec<Box<dyn Reporter>> = vec![
            Box::new(Recorder { seen: seen_a.clone(), stop_after: None }),
            Box::new(Recorder { seen: seen_b.clone(), stop_after: None }),
        ];
        let mut poller = Poller::new(context(tmp.path(), "alice"), reporters, Duration::ZERO);

        let outcome = poller.run_once().unwrap();

        assert_eq!(seen_a.lock().unwrap().as_slice(), &[outcome.repositories.clone()]);
        assert_eq!(seen_b.lock().unwrap().as_slice(), &[outcome.repositories]);
    }

    #[test]
    fn reporter_failure_aborts_the_cycle() {
        let tmp = TempDir::new().unwrap();
        let mut poller = Poller::new(
            context(tmp.path(), "alice"),
            boxed(Failing),
            Duration::ZERO,
        );

        let err = poller.run_once().unwrap_err();
        assert!(format!("{err:#}").contains("failing reporter failed"));
    }

    #[tokio::test]
    async fn daemon_does_nothing_when_already_cancelled() {
        let tmp = TempDir::new().unwrap();
        let seen: Seen = Arc::default();
        let mut poller = Poller::new(
            context(tmp.path(), "alice"),
            boxed(Recorder { seen: seen.clone(), stop_after: None }),
            Duration::from_millis(1),
        );
        let (tx, rx) = shutdown_channel();
        tx.send_replace(true);

        let cycles = poller.run(rx).await.unwrap();

        assert_eq!(cycles, 0);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn daemon_repeats_until_cancelled() {
        let tmp = TempDir::new().unwrap();
        add_repo(tmp.path(), "dirty", "alice");

        let seen: Seen = Arc::default();
        let (tx, rx) = shutdown_channel();
        let mut poller = Poller::new(
            context(tmp.path(), "alice"),
            boxed(Recorder { seen: seen.clone(), stop_after: Some((3, tx)) }),
            Duration::from_millis(5),
        );

        let cycles = poller.run(rx).await.unwrap();

        assert_eq!(cycles, 3);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|repos| repos == &seen[0]));
    }

    #[tokio::test]
    async fn daemon_wakes_from_sleep_on_cancel() {
        let tmp = TempDir::new().unwrap();
        let mut poller = Poller::new(context(tmp.path(), "alice"), Vec::new(), Duration::from_secs(3600));
        let (tx, rx) = shutdown_channel();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            tx.send_replace(true);
        });

        let cycles = tokio::time::timeout(Duration::from_secs(10), poller.run(rx))
            .await
            .expect("daemon did not stop")
            .unwrap();

        assert_eq!(cycles, 1);
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Run command - one-shot or daemon reporting

use crate::config::Settings;
use crate::cycle::{shutdown_channel, Poller};
use crate::report::{ConkyReporter, ConsoleReporter, DelimitedReporter, Reporter};
use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Console presentation options
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleOptions {
    /// Print JSON instead of lines
    pub json: bool,
    /// Colorize output
    pub color: bool,
    /// Print the listing even when a conky feed is configured
    pub verbose: bool,
}

/// Reporters for `settings`, in the order they run
#[must_use]
pub fn build_reporters(settings: &Settings, console: ConsoleOptions) -> Vec<Box<dyn Reporter>> {
    let mut reporters: Vec<Box<dyn Reporter>> = Vec::new();

    if let Some(path) = &settings.file {
        reporters.push(Box::new(DelimitedReporter::new(path)));
    }
    if let Some(path) = &settings.conky {
        reporters.push(Box::new(ConkyReporter::new(path)));
    }
    if settings.conky.is_none() || console.verbose {
        reporters.push(Box::new(ConsoleReporter::stdout(console.json, console.color)));
    }

    reporters
}

/// Run the configured scan once, or repeatedly until interrupted
pub async fn run(settings: Settings, console: ConsoleOptions) -> Result<()> {
    debug!("Scanning {} for repositories owned by {}", settings.root.display(), settings.owner);

    let context = settings.cycle_context().context("Invalid owner settings")?;
    let reporters = build_reporters(&settings, console);
    let mut poller = Poller::new(context, reporters, settings.interval);

    if !settings.daemon {
        poller.run_once()?;
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    tokio::spawn(async move {
        wait_for_signal().await;
        debug!("Shutdown requested, stopping after the current cycle");
        shutdown_tx.send_replace(true);
    });

    poller.run(shutdown_rx).await?;
    Ok(())
}

/// Return once a signal arrived; a listener that failed to install never returns
async fn settle(received: std::io::Result<()>, source: &str) {
    if let Err(err) = received {
        warn!("Cannot listen for {}: {}", source, err);
        std::future::pending::<()>().await;
    }
}

async fn ctrl_c() {
    settle(tokio::signal::ctrl_c().await, "Ctrl-C").await;
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            terminate.recv().await;
        }
        Err(err) => settle(Err(err), "SIGTERM").await,
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}

async fn wait_for_signal() {
    tokio::select! {
        () = ctrl_c() => {}
        () = terminate() => {}
    }
}

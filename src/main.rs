// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Repoporter CLI - uncommitted-change reports for your local checkouts

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use repoporter::commands;
use repoporter::config::{Config, Overrides};
use repoporter::status::ClassifyMode;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "repoporter")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Directory to analyze (defaults to your home directory)
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Owner username of the repositories
    #[arg(short, long)]
    owner: Option<String>,

    /// Print supplementary information (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (suppress non-error logging)
    #[arg(short, long)]
    quiet: bool,

    /// Run as a daemon, rescanning on an interval
    #[arg(short, long)]
    daemon: bool,

    /// Update interval in seconds when run as a daemon [default: 10]
    #[arg(short, long, value_name = "SECONDS")]
    timer: Option<u64>,

    /// Write a delimited export to this file
    #[arg(short, long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Write a conky feed script to this file
    #[arg(short, long, value_name = "FILE")]
    conky: Option<PathBuf>,

    /// Configuration file path
    #[arg(long, env = "REPOPORTER_CONFIG")]
    config: Option<PathBuf>,

    /// Forge host matched in remote URLs [default: github.com]
    #[arg(long)]
    host: Option<String>,

    /// How git status output is classified
    #[arg(long, value_enum)]
    classify: Option<ClassifyMode>,

    /// Directory names to skip while scanning (glob, repeatable)
    #[arg(long, value_name = "GLOB")]
    exclude: Vec<String>,

    /// Maximum scan depth (0 = unlimited)
    #[arg(long)]
    max_depth: Option<usize>,

    /// Follow symbolic links while scanning
    #[arg(long)]
    follow_symlinks: bool,

    /// Print the console listing as JSON
    #[arg(long)]
    json: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish)
        shell: clap_complete::Shell,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut command = Cli::command();
        return commands::completions::run(shell, &mut command, &mut std::io::stdout());
    }

    // Initialize logging
    let log_level = match cli.verbose {
        0 if cli.quiet => tracing::Level::ERROR,
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_level.as_str())),
        )
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color && std::io::stderr().is_terminal())
        .with_target(false)
        .init();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.apply(Overrides {
        path: cli.path,
        owner: cli.owner,
        host: cli.host,
        daemon: cli.daemon,
        timer: cli.timer,
        file: cli.file,
        conky: cli.conky,
        classify: cli.classify,
        exclude: cli.exclude,
        max_depth: cli.max_depth,
        follow_symlinks: cli.follow_symlinks,
    });

    let settings = config.resolve()?;

    let console = commands::run::ConsoleOptions {
        json: cli.json,
        color: !cli.no_color && std::io::stdout().is_terminal(),
        verbose: cli.verbose > 0,
    };
    commands::run::run(settings, console).await
}

//! submit-queue - merge-queue bot for GitHub pull requests
//!
//! ## Commands
//!
//! - `check`: evaluate open PRs and report which are ready, without merging
//! - `merge`: squash-merge every ready PR
//! - `status`: show the aggregated commit status of one PR
//! - `whitelist`: print the effective author whitelist

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::{GlobalOptions, MergeOptions, StatusOptions};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "submit-queue")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Merge-queue bot: gates open PRs on labels, whitelist, approval and status")]
struct Cli {
    /// Config file (default: <config dir>/submit-queue/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Repository owner (overrides the config file)
    #[arg(long, global = true)]
    owner: Option<String>,

    /// Repository name (overrides the config file)
    #[arg(long, global = true)]
    repo: Option<String>,

    /// Ignore PRs numbered below this (overrides the config file)
    #[arg(long, global = true)]
    min_pr_number: Option<u64>,

    /// Make no mutating API calls
    #[arg(long, global = true)]
    dry_run: bool,

    /// Stop after the first ready PR
    #[arg(long, global = true)]
    once: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate open PRs and report which are ready to merge, without merging
    ///
    /// Marker labels and comments are still applied unless --dry-run is set.
    Check {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Merge every PR that passes all gates
    Merge {
        /// Prompt before each merge
        #[arg(long)]
        confirm: bool,
    },

    /// Show the aggregated commit status of a PR
    Status {
        /// PR number
        pr: u64,

        /// Keep polling while the status is pending
        #[arg(long)]
        wait: bool,

        /// Wait for the status to turn pending first (after requesting a re-test)
        #[arg(long)]
        wait_for_pending: bool,
    },

    /// Print the effective author whitelist
    Whitelist,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "submit_queue=debug"
    } else {
        "submit_queue=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, stopping");
            on_signal.cancel();
        }
    });

    let globals = GlobalOptions {
        config: cli.config,
        owner: cli.owner,
        repo: cli.repo,
        min_pr_number: cli.min_pr_number,
        dry_run: cli.dry_run,
        once: cli.once,
    };
    let mut ctx = cli::CommandContext::new(&globals, cancel).await?;

    match cli.command {
        Commands::Check { json } => cli::run_check(&mut ctx, json).await?,
        Commands::Merge { confirm } => cli::run_merge(&mut ctx, MergeOptions { confirm }).await?,
        Commands::Status {
            pr,
            wait,
            wait_for_pending,
        } => {
            let options = StatusOptions {
                wait_for_pending,
                wait,
            };
            cli::run_status(&ctx, pr, options).await?;
        }
        Commands::Whitelist => cli::run_whitelist(&mut ctx).await?,
    }

    Ok(())
}

// src/main.rs

use anyhow::{Context, Result};
use clap::Parser;
use git_forensics::cli::Args;
use git_forensics::report::{self, TABLE_HEADERS};
use git_forensics::{
    FilteredLog, ForensicsSummary, GitClient, GitRepositoryMiner, MiningOutcome,
    RepositoryStatistics,
};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let start_time = Instant::now();
    let state_path = args.state_path();

    let previous = RepositoryStatistics::load(&state_path)
        .with_context(|| format!("Failed to load snapshot {}", state_path.display()))?;
    let client = GitClient::open(&args.repo)
        .with_context(|| format!("Failed to open git repository at {}", args.repo.display()))?;

    let cancel = CancellationToken::new();
    let miner = GitRepositoryMiner::new(client, cancel.clone());
    let mut task = tokio::task::spawn_blocking(move || {
        let mut log = FilteredLog::new("Errors while mining the repository:");
        let result = miner.mine_outcome(&previous, &mut log);
        (previous, result, log)
    });

    let (previous, result, log) = tokio::select! {
        joined = &mut task => joined?,
        _ = tokio::signal::ctrl_c() => {
            cancel.cancel();
            task.await?
        }
    };
    let outcome = result.context("Mining was interrupted")?;

    for line in log.error_messages() {
        eprintln!("{}", line);
    }
    let current = match outcome {
        MiningOutcome::Mined(current) => current,
        MiningOutcome::Unavailable(_) => {
            warn!("Mining was not possible, keeping the previous snapshot");
            return Ok(());
        }
    };

    for line in ForensicsSummary::new(&previous, &current).lines() {
        println!("{}", line);
    }
    println!();
    println!("{}", TABLE_HEADERS.join("\t"));
    for row in report::rows(&current, args.sort, true).iter().take(args.top) {
        println!("{}", row.cells().join("\t"));
    }

    if !args.dry_run {
        current
            .save(&state_path)
            .with_context(|| format!("Failed to store snapshot {}", state_path.display()))?;
    }

    println!("Total time: {:.2?}", start_time.elapsed());
    Ok(())
}

//! Incremental mining of Git history into per-file statistics.
//!
//! A [`RepositoryMiner`] asks a [`CommitCollector`] for every commit newer
//! than the cursor of the previous [`RepositoryStatistics`] snapshot and folds
//! them, oldest first, into a copy of that snapshot. Each file keeps its
//! commit history together with authorship, churn and lines of code.
//!
//! ```no_run
//! use git_forensics::{FilteredLog, GitClient, GitRepositoryMiner, RepositoryMiner, RepositoryStatistics};
//! use std::path::Path;
//! use tokio_util::sync::CancellationToken;
//!
//! let client = GitClient::open(Path::new(".")).unwrap();
//! let miner = GitRepositoryMiner::new(client, CancellationToken::new());
//! let mut log = FilteredLog::default();
//! let statistics = miner.mine(&RepositoryStatistics::new(), &mut log).unwrap();
//! println!("{} files", statistics.len());
//! ```

pub mod cli;
pub mod commit_stats;
pub mod error;
pub mod git;
pub mod log;
pub mod miner;
pub mod model;
pub mod report;
pub mod statistics;

pub use commit_stats::CommitStatistics;
pub use error::{Cancelled, CollectError, SnapshotError};
pub use git::GitClient;
pub use log::FilteredLog;
pub use miner::{
    CollectedCommits, CommitCollector, GitRepositoryMiner, MiningOutcome, RepositoryMiner,
};
pub use model::{CommitDiff, CommitRecord, Timestamp};
pub use report::{FileRow, ForensicsSummary, SortColumn};
pub use statistics::{FileStatistics, RepositoryStatistics};

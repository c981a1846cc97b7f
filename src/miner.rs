// src/miner.rs

use crate::commit_stats::CommitStatistics;
use crate::error::{Cancelled, CollectError};
use crate::log::FilteredLog;
use crate::model::{CommitDiff, CommitRecord};
use crate::statistics::RepositoryStatistics;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Commits reported by a revision-control client, newest first
#[derive(Debug, Default)]
pub struct CollectedCommits {
    pub commits: Vec<CommitDiff>,
    /// Commit the walk started from, the cursor for the next pass
    pub head: Option<String>,
    pub log: FilteredLog,
}

/// Result of a mining pass that was not cancelled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MiningOutcome {
    /// New commits, if any, were folded into the previous snapshot
    Mined(RepositoryStatistics),
    /// The repository could not be read; the snapshot is empty
    Unavailable(RepositoryStatistics),
}

impl MiningOutcome {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, MiningOutcome::Unavailable(_))
    }

    pub fn into_statistics(self) -> RepositoryStatistics {
        match self {
            MiningOutcome::Mined(statistics) | MiningOutcome::Unavailable(statistics) => statistics,
        }
    }
}

/// A revision-control client able to enumerate commits and their file diffs.
pub trait CommitCollector {
    /// Human readable location of the repository
    fn work_tree(&self) -> String;

    /// Returns every commit strictly newer than `latest_commit_id` (all
    /// commits when it is empty), newest first. Must stop with
    /// [`CollectError::Cancelled`] once `cancel` is raised.
    fn collect_since(
        &self,
        latest_commit_id: &str,
        cancel: &CancellationToken,
    ) -> Result<CollectedCommits, CollectError>;
}

/// Incrementally mines a repository into a new statistics snapshot.
pub trait RepositoryMiner {
    /// Folds every commit newer than `previous` into a copy of it.
    ///
    /// `previous` is never modified. If the repository cannot be read the
    /// failure is logged and an empty snapshot is returned, discarding
    /// `previous`. Only cancellation is reported as an error.
    fn mine(
        &self,
        previous: &RepositoryStatistics,
        logger: &mut FilteredLog,
    ) -> Result<RepositoryStatistics, Cancelled>;
}

/// Miner for Git repositories
pub struct GitRepositoryMiner<C> {
    collector: C,
    cancel: CancellationToken,
}

impl<C: CommitCollector> GitRepositoryMiner<C> {
    pub fn new(collector: C, cancel: CancellationToken) -> Self {
        Self { collector, cancel }
    }

    /// Like [`RepositoryMiner::mine`], but tells an unreadable repository
    /// apart from a successful pass.
    pub fn mine_outcome(
        &self,
        previous: &RepositoryStatistics,
        logger: &mut FilteredLog,
    ) -> Result<MiningOutcome, Cancelled> {
        let start = Instant::now();
        logger.log_info(format!(
            "Analyzing the commit log of the Git repository '{}'",
            self.collector.work_tree()
        ));

        let collected = match self
            .collector
            .collect_since(previous.latest_commit_id(), &self.cancel)
        {
            Ok(collected) => collected,
            Err(CollectError::Cancelled) => {
                warn!("Mining of '{}' was cancelled", self.collector.work_tree());
                return Err(Cancelled);
            }
            Err(error) => {
                logger.log_exception(
                    &error,
                    "Exception occurred while mining the Git repository using GitClient",
                );
                return Ok(MiningOutcome::Unavailable(RepositoryStatistics::new()));
            }
        };
        logger.merge(collected.log);

        let mut commits: Vec<CommitRecord> = collected
            .commits
            .into_iter()
            .map(CommitRecord::from)
            .collect();
        logger.log_info(format!(
            "-> Created report in {} seconds",
            1 + start.elapsed().as_secs()
        ));
        CommitStatistics::log_commits(&commits, logger);

        let latest_commit_id = collected
            .head
            .or_else(|| commits.first().map(|newest| newest.id().to_string()))
            .unwrap_or_else(|| previous.latest_commit_id().to_string());
        let mut current = RepositoryStatistics::with_latest_commit(latest_commit_id);
        current.add_all_from(previous);
        // oldest first, otherwise the histories would be built backwards
        commits.reverse();
        current.add_all(commits);

        Ok(MiningOutcome::Mined(current))
    }
}

impl<C: CommitCollector> RepositoryMiner for GitRepositoryMiner<C> {
    fn mine(
        &self,
        previous: &RepositoryStatistics,
        logger: &mut FilteredLog,
    ) -> Result<RepositoryStatistics, Cancelled> {
        self.mine_outcome(previous, logger)
            .map(MiningOutcome::into_statistics)
    }
}

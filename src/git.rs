// src/git.rs

use crate::error::CollectError;
use crate::log::FilteredLog;
use crate::miner::{CollectedCommits, CommitCollector};
use crate::model::CommitDiff;
use git2::{Commit, Delta, DiffFindOptions, DiffOptions, Oid, Patch, Repository, Sort};
use indicatif::ProgressBar;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Reads commits and per-file line counts from a Git repository using libgit2.
pub struct GitClient {
    repo: Repository,
}

impl GitClient {
    /// Opens the repository containing `path`.
    pub fn open(path: &Path) -> Result<Self, CollectError> {
        let repo = Repository::discover(path)?;
        debug!("Opened git repository at {:?}", repo.path());
        Ok(Self { repo })
    }

    /// Appends one diff per file touched by `commit`.
    fn diff_commit(
        &self,
        commit: &Commit,
        diffs: &mut Vec<CommitDiff>,
        log: &mut FilteredLog,
    ) -> Result<(), CollectError> {
        let tree = commit.tree()?;
        let parent_tree = if commit.parent_count() == 0 {
            None
        } else {
            Some(commit.parent(0)?.tree()?)
        };

        let mut diff_opts = DiffOptions::new();
        diff_opts.ignore_filemode(true);
        let mut diff =
            self.repo
                .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut diff_opts))?;

        let mut find_opts = DiffFindOptions::new();
        find_opts.renames(true);
        diff.find_similar(Some(&mut find_opts))?;

        let commit_id = commit.id().to_string();
        let author = commit.author();
        let author_name = author.name().unwrap_or("").to_string();
        let author_email = author.email().unwrap_or("").to_string();
        let timestamp = commit.time().seconds();

        for (index, delta) in diff.deltas().enumerate() {
            let status = delta.status();
            let is_delete = status == Delta::Deleted;
            let file = if is_delete {
                delta.old_file()
            } else {
                delta.new_file()
            };
            let Some(path) = file.path().and_then(|p| p.to_str()) else {
                log.log_error(format!(
                    "Skipping file with a non UTF-8 path in commit {}",
                    commit_id
                ));
                continue;
            };

            let renamed_from = if status == Delta::Renamed {
                delta
                    .old_file()
                    .path()
                    .and_then(|p| p.to_str())
                    .map(String::from)
            } else {
                None
            };

            // binary files have no patch
            let (added_lines, deleted_lines) = match Patch::from_diff(&diff, index)? {
                Some(patch) => {
                    let (_, additions, deletions) = patch.line_stats()?;
                    (additions, deletions)
                }
                None => (0, 0),
            };

            diffs.push(CommitDiff {
                commit_id: commit_id.clone(),
                timestamp,
                author_name: author_name.clone(),
                author_email: author_email.clone(),
                path: path.to_string(),
                added_lines,
                deleted_lines,
                is_delete,
                renamed_from,
            });
        }

        Ok(())
    }
}

impl CommitCollector for GitClient {
    fn work_tree(&self) -> String {
        self.repo
            .workdir()
            .unwrap_or_else(|| self.repo.path())
            .display()
            .to_string()
    }

    fn collect_since(
        &self,
        latest_commit_id: &str,
        cancel: &CancellationToken,
    ) -> Result<CollectedCommits, CollectError> {
        let mut log = FilteredLog::new("Errors while reading the Git history:");

        if self.repo.is_empty()? {
            log.log_info("-> Repository has no commits yet");
            return Ok(CollectedCommits {
                log,
                ..CollectedCommits::default()
            });
        }

        let head = self.repo.head()?.peel_to_commit()?.id();
        let mut revwalk = self.repo.revwalk()?;
        // children before parents even when their clocks disagree
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(head)?;
        if !latest_commit_id.is_empty() {
            revwalk.hide(Oid::from_str(latest_commit_id)?)?;
        }

        let bar = ProgressBar::new_spinner();
        bar.set_message("Reading commits");

        let mut commits = Vec::new();
        let mut skipped_merges = 0;
        for oid in revwalk {
            if cancel.is_cancelled() {
                bar.abandon_with_message("Cancelled");
                return Err(CollectError::Cancelled);
            }

            let commit = self.repo.find_commit(oid?)?;
            // a merge only repeats changes already counted on its parents
            if commit.parent_count() > 1 {
                skipped_merges += 1;
                continue;
            }
            self.diff_commit(&commit, &mut commits, &mut log)?;
            bar.inc(1);
        }
        bar.finish_and_clear();
        debug!(
            "Collected {} file changes, skipped {} merge commits",
            commits.len(),
            skipped_merges
        );

        Ok(CollectedCommits {
            commits,
            head: Some(head.to_string()),
            log,
        })
    }
}

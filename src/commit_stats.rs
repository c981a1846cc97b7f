// src/commit_stats.rs

use crate::log::FilteredLog;
use crate::model::CommitRecord;
use std::collections::HashSet;

/// Summary counters over a batch of commit records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitStatistics {
    commit_count: usize,
    author_count: usize,
    files_count: usize,
    added_lines: usize,
    deleted_lines: usize,
}

impl CommitStatistics {
    pub fn new(commits: &[CommitRecord]) -> Self {
        let mut ids = HashSet::new();
        let mut authors = HashSet::new();
        let mut files = HashSet::new();
        let mut added_lines = 0;
        let mut deleted_lines = 0;

        for commit in commits {
            ids.insert(commit.id());
            authors.insert(commit.author());
            files.insert(commit.path());
            added_lines += commit.added_lines();
            deleted_lines += commit.deleted_lines();
        }

        Self {
            commit_count: ids.len(),
            author_count: authors.len(),
            files_count: files.len(),
            added_lines,
            deleted_lines,
        }
    }

    /// Number of distinct commits
    pub fn total_commits(&self) -> usize {
        self.commit_count
    }

    pub fn distinct_authors(&self) -> usize {
        self.author_count
    }

    pub fn distinct_files(&self) -> usize {
        self.files_count
    }

    pub fn total_added(&self) -> usize {
        self.added_lines
    }

    pub fn total_deleted(&self) -> usize {
        self.deleted_lines
    }

    /// Writes the summary lines that build reports parse.
    pub fn log_commits(commits: &[CommitRecord], logger: &mut FilteredLog) -> Self {
        let statistics = Self::new(commits);
        logger.log_info(format!("Found {} commits", statistics.commit_count));
        logger.log_info(format!("-> {} authors", statistics.author_count));
        logger.log_info(format!("-> {} files", statistics.files_count));
        logger.log_info(format!("-> {} lines added", statistics.added_lines));
        logger.log_info(format!("-> {} lines deleted", statistics.deleted_lines));
        statistics
    }
}

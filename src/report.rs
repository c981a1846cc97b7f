// src/report.rs

use crate::commit_stats::CommitStatistics;
use crate::model::{CommitRecord, Timestamp};
use crate::statistics::{FileStatistics, RepositoryStatistics};
use chrono::{TimeZone, Utc};
use std::cmp::Ordering;
use std::collections::HashSet;

pub const TABLE_HEADERS: [&str; 7] = [
    "File Name",
    "Authors",
    "Commits",
    "Last Commit",
    "Added",
    "LOC",
    "Churn",
];

const SHORT_ID_LENGTH: usize = 7;

/// Plain-text representation of a commit id
pub fn short_id(id: &str) -> &str {
    id.char_indices()
        .nth(SHORT_ID_LENGTH)
        .map_or(id, |(end, _)| &id[..end])
}

/// Column of the file table
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortColumn {
    Name,
    Authors,
    Commits,
    LastCommit,
    Added,
    Loc,
    Churn,
}

/// One row of the file table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRow {
    pub file_name: String,
    pub authors: usize,
    pub commits: usize,
    pub last_commit: Option<Timestamp>,
    pub added: usize,
    pub loc: usize,
    pub churn: usize,
}

impl FileRow {
    pub fn new(file: &FileStatistics) -> Self {
        Self {
            file_name: file.file_name().to_string(),
            authors: file.author_count(),
            commits: file.commit_count(),
            last_commit: file.last_commit_time(),
            added: file.added_lines(),
            loc: file.lines_of_code(),
            churn: file.churn(),
        }
    }

    /// Cells in the order of [`TABLE_HEADERS`]
    pub fn cells(&self) -> [String; 7] {
        [
            self.file_name.clone(),
            self.authors.to_string(),
            self.commits.to_string(),
            self.last_commit.map(format_time).unwrap_or_default(),
            self.added.to_string(),
            self.loc.to_string(),
            self.churn.to_string(),
        ]
    }

    fn compare(&self, other: &FileRow, column: SortColumn) -> Ordering {
        let primary = match column {
            SortColumn::Name => Ordering::Equal,
            SortColumn::Authors => self.authors.cmp(&other.authors),
            SortColumn::Commits => self.commits.cmp(&other.commits),
            SortColumn::LastCommit => self.last_commit.cmp(&other.last_commit),
            SortColumn::Added => self.added.cmp(&other.added),
            SortColumn::Loc => self.loc.cmp(&other.loc),
            SortColumn::Churn => self.churn.cmp(&other.churn),
        };
        primary.then_with(|| self.file_name.cmp(&other.file_name))
    }
}

fn format_time(timestamp: Timestamp) -> String {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .map(|time| time.to_rfc3339())
        .unwrap_or_default()
}

/// Rows of all live files, sorted by `column`.
pub fn rows(statistics: &RepositoryStatistics, column: SortColumn, descending: bool) -> Vec<FileRow> {
    let mut rows: Vec<FileRow> = statistics.files().map(FileRow::new).collect();
    rows.sort_by(|a, b| {
        let order = a.compare(b, column);
        if descending {
            order.reverse()
        } else {
            order
        }
    });
    rows
}

/// Records of `current` that `previous` does not know yet
pub fn new_commits<'a>(
    previous: &RepositoryStatistics,
    current: &'a RepositoryStatistics,
) -> Vec<&'a CommitRecord> {
    let known: HashSet<(&str, &str)> = previous
        .all_files()
        .flat_map(FileStatistics::history)
        .map(|record| (record.id(), record.path()))
        .collect();
    let mut records: Vec<&CommitRecord> = current
        .all_files()
        .flat_map(FileStatistics::history)
        .filter(|record| !known.contains(&(record.id(), record.path())))
        .collect();
    records.sort_by_key(|record| record.timestamp());
    records
}

/// Build summary of one mining pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForensicsSummary {
    files: usize,
    lines_of_code: usize,
    churn: usize,
    initial_recording: bool,
    latest_commit_id: String,
    new_commits: CommitStatistics,
}

impl ForensicsSummary {
    pub fn new(previous: &RepositoryStatistics, current: &RepositoryStatistics) -> Self {
        let added: Vec<CommitRecord> = new_commits(previous, current)
            .into_iter()
            .cloned()
            .collect();
        Self {
            files: current.len(),
            lines_of_code: current.total_lines_of_code(),
            churn: current.total_churn(),
            initial_recording: !previous.has_latest_commit(),
            latest_commit_id: current.latest_commit_id().to_string(),
            new_commits: CommitStatistics::new(&added),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("{} repository files", self.files),
            format!("total lines of code: {}", self.lines_of_code),
            format!("total churn: {}", self.churn),
            format!("New added lines: {}", self.new_commits.total_added()),
            format!("New deleted lines: {}", self.new_commits.total_deleted()),
        ];
        if self.initial_recording {
            lines.push(format!(
                "Initial recording of {} commits",
                self.new_commits.total_commits()
            ));
        } else {
            lines.push(format!("New commits: {}", self.new_commits.total_commits()));
        }
        lines.push(format!(
            "from {} authors",
            self.new_commits.distinct_authors()
        ));
        lines.push(format!("in {} files", self.new_commits.distinct_files()));
        if !self.latest_commit_id.is_empty() {
            lines.push(format!("Latest commit: {}", short_id(&self.latest_commit_id)));
        }
        lines
    }
}

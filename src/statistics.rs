// src/statistics.rs

use crate::error::SnapshotError;
use crate::model::{CommitRecord, Timestamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::Path;
use tracing::debug;

const SECONDS_PER_DAY: i64 = 86_400;

/// Accumulated history of a single file and the metrics derived from it.
///
/// History is kept oldest first. The derived metrics are updated on every
/// append, so reading them never walks the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredFile", into = "StoredFile")]
pub struct FileStatistics {
    file_name: String,
    history: Vec<CommitRecord>,
    /// Author -> number of commits
    authors: BTreeMap<String, usize>,
    added_lines: usize,
    deleted_lines: usize,
    lines_of_code: usize,
    churn: usize,
}

impl FileStatistics {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            history: Vec::new(),
            authors: BTreeMap::new(),
            added_lines: 0,
            deleted_lines: 0,
            lines_of_code: 0,
            churn: 0,
        }
    }

    /// Adds a commit. Chronological submission appends in O(1); an older
    /// record is inserted at its position and the metrics are rebuilt.
    pub fn add(&mut self, record: CommitRecord) {
        let position = self
            .history
            .partition_point(|existing| existing.timestamp() <= record.timestamp());
        if position == self.history.len() {
            self.apply(&record);
            self.history.push(record);
        } else {
            debug!(
                "Commit {} of '{}' is older than its successors, rebuilding metrics",
                record.id(),
                self.file_name
            );
            self.history.insert(position, record);
            self.replay();
        }
    }

    /// Takes over the history of `other`, keeping the result chronological.
    pub fn absorb(&mut self, other: FileStatistics) {
        self.history.extend(other.history);
        self.history.sort_by_key(CommitRecord::timestamp);
        self.replay();
    }

    fn apply(&mut self, record: &CommitRecord) {
        *self.authors.entry(record.author().to_string()).or_insert(0) += 1;
        self.added_lines += record.added_lines();
        self.deleted_lines += record.deleted_lines();
        self.churn += record.added_lines() + record.deleted_lines();
        self.lines_of_code = if record.is_delete() {
            0
        } else {
            (self.lines_of_code + record.added_lines()).saturating_sub(record.deleted_lines())
        };
    }

    fn replay(&mut self) {
        let history = std::mem::take(&mut self.history);
        let mut rebuilt = FileStatistics::new(std::mem::take(&mut self.file_name));
        for record in &history {
            rebuilt.apply(record);
        }
        rebuilt.history = history;
        *self = rebuilt;
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn history(&self) -> &[CommitRecord] {
        &self.history
    }

    pub fn author_count(&self) -> usize {
        self.authors.len()
    }

    /// Commits per author
    pub fn authors(&self) -> &BTreeMap<String, usize> {
        &self.authors
    }

    pub fn commit_count(&self) -> usize {
        self.history.len()
    }

    pub fn added_lines(&self) -> usize {
        self.added_lines
    }

    pub fn deleted_lines(&self) -> usize {
        self.deleted_lines
    }

    pub fn lines_of_code(&self) -> usize {
        self.lines_of_code
    }

    pub fn churn(&self) -> usize {
        self.churn
    }

    pub fn creation_time(&self) -> Option<Timestamp> {
        self.history.first().map(CommitRecord::timestamp)
    }

    pub fn last_commit_time(&self) -> Option<Timestamp> {
        self.history.last().map(CommitRecord::timestamp)
    }

    pub fn last_commit_id(&self) -> Option<&str> {
        self.history.last().map(CommitRecord::id)
    }

    /// Whether the most recent commit deleted the file
    pub fn is_deleted(&self) -> bool {
        self.history.last().is_some_and(CommitRecord::is_delete)
    }

    pub fn age_in_days(&self, now: DateTime<Utc>) -> i64 {
        self.creation_time()
            .map_or(0, |created| days_between(created, now.timestamp()))
    }

    pub fn days_since_last_commit(&self, now: DateTime<Utc>) -> i64 {
        self.last_commit_time()
            .map_or(0, |last| days_between(last, now.timestamp()))
    }
}

fn days_between(from: Timestamp, to: Timestamp) -> i64 {
    (to - from).max(0) / SECONDS_PER_DAY
}

/// On-disk form of a file entry; the metrics are rebuilt when loading.
#[derive(Serialize, Deserialize)]
struct StoredFile {
    file_name: String,
    history: Vec<CommitRecord>,
}

impl From<StoredFile> for FileStatistics {
    fn from(stored: StoredFile) -> Self {
        let mut file = FileStatistics::new(stored.file_name);
        file.history = stored.history;
        file.history.sort_by_key(CommitRecord::timestamp);
        file.replay();
        file
    }
}

impl From<FileStatistics> for StoredFile {
    fn from(file: FileStatistics) -> Self {
        Self {
            file_name: file.file_name,
            history: file.history,
        }
    }
}

/// Snapshot of the per-file statistics up to `latest_commit_id`.
///
/// Deleted files keep a tombstoned entry: their history still counts for
/// churn and commit totals, but they are hidden from the live views.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryStatistics {
    #[serde(default)]
    latest_commit_id: String,
    #[serde(default)]
    files: BTreeMap<String, FileStatistics>,
}

impl RepositoryStatistics {
    /// Creates an empty snapshot without a cursor.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latest_commit(latest_commit_id: impl Into<String>) -> Self {
        Self {
            latest_commit_id: latest_commit_id.into(),
            files: BTreeMap::new(),
        }
    }

    /// Id of the newest commit folded into this snapshot, empty when fresh
    pub fn latest_commit_id(&self) -> &str {
        &self.latest_commit_id
    }

    pub fn has_latest_commit(&self) -> bool {
        !self.latest_commit_id.is_empty()
    }

    /// Copies every entry of `other` into this snapshot.
    pub fn add_all_from(&mut self, other: &RepositoryStatistics) {
        for (path, file) in &other.files {
            self.files.insert(path.clone(), file.clone());
        }
    }

    /// Folds a chronological batch of commits into this snapshot.
    pub fn add_all(&mut self, commits: impl IntoIterator<Item = CommitRecord>) {
        for commit in commits {
            self.add(commit);
        }
    }

    pub fn add(&mut self, commit: CommitRecord) {
        if let Some(old_path) = commit.old_path() {
            self.relink(old_path, commit.path());
        }
        self.files
            .entry(commit.path().to_string())
            .or_insert_with(|| FileStatistics::new(commit.path()))
            .add(commit);
    }

    /// Moves the history of `old_path` to `new_path`.
    fn relink(&mut self, old_path: &str, new_path: &str) {
        let Some(mut moved) = self.files.remove(old_path) else {
            debug!("Rename source '{}' of '{}' is unknown", old_path, new_path);
            return;
        };
        debug!("Continuing history of '{}' as '{}'", old_path, new_path);
        moved.file_name = new_path.to_string();
        let relinked = match self.files.remove(new_path) {
            Some(mut existing) => {
                existing.absorb(moved);
                existing
            }
            None => moved,
        };
        self.files.insert(new_path.to_string(), relinked);
    }

    /// Live files, ordered by path
    pub fn files(&self) -> impl Iterator<Item = &FileStatistics> {
        self.files.values().filter(|file| !file.is_deleted())
    }

    /// All entries including deleted files
    pub fn all_files(&self) -> impl Iterator<Item = &FileStatistics> {
        self.files.values()
    }

    /// Statistics of a live file
    pub fn get(&self, path: &str) -> Option<&FileStatistics> {
        self.files.get(path).filter(|file| !file.is_deleted())
    }

    /// Statistics of a file, even when it has been deleted
    pub fn history_of(&self, path: &str) -> Option<&FileStatistics> {
        self.files.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Number of live files
    pub fn len(&self) -> usize {
        self.files().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of commit records across all entries
    pub fn total_commits(&self) -> usize {
        self.all_files().map(FileStatistics::commit_count).sum()
    }

    pub fn total_lines_of_code(&self) -> usize {
        self.files().map(FileStatistics::lines_of_code).sum()
    }

    pub fn total_churn(&self) -> usize {
        self.all_files().map(FileStatistics::churn).sum()
    }

    /// Loads a snapshot; a missing file yields an empty snapshot.
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!("No snapshot at {:?}, starting from scratch", path);
                return Ok(Self::new());
            }
            Err(error) => return Err(error.into()),
        };
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(fs::File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        debug!("Stored snapshot at {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn record(id: &str, timestamp: Timestamp, author: &str, path: &str, added: usize, deleted: usize) -> CommitRecord {
        CommitRecord::new(id, timestamp, author, path, added, deleted)
    }

    #[test]
    fn test_file_metrics() {
        let mut file = FileStatistics::new("file.txt");
        file.add(record("c1", 100, "bob", "file.txt", 20, 0));
        file.add(record("c2", 200, "alice", "file.txt", 10, 0));
        file.add(record("c3", 300, "bob", "file.txt", 5, 1));

        assert_eq!(file.commit_count(), 3);
        assert_eq!(file.author_count(), 2);
        assert_eq!(file.authors().get("bob"), Some(&2));
        assert_eq!(file.added_lines(), 35);
        assert_eq!(file.deleted_lines(), 1);
        assert_eq!(file.lines_of_code(), 34);
        assert_eq!(file.churn(), 36);
        assert_eq!(file.creation_time(), Some(100));
        assert_eq!(file.last_commit_time(), Some(300));
        assert_eq!(file.last_commit_id(), Some("c3"));
    }

    #[test]
    fn test_lines_of_code_never_negative() {
        let mut file = FileStatistics::new("a");
        file.add(record("c1", 1, "bob", "a", 2, 0));
        file.add(record("c2", 2, "bob", "a", 0, 7));
        assert_eq!(file.lines_of_code(), 0);
        assert_eq!(file.churn(), 9);
    }

    #[test]
    fn test_out_of_order_commit_is_inserted_chronologically() {
        let mut in_order = FileStatistics::new("a");
        in_order.add(record("c1", 10, "bob", "a", 5, 0));
        in_order.add(record("c2", 20, "eve", "a", 3, 1));
        in_order.add(record("c3", 30, "bob", "a", 1, 2));

        let mut shuffled = FileStatistics::new("a");
        shuffled.add(record("c1", 10, "bob", "a", 5, 0));
        shuffled.add(record("c3", 30, "bob", "a", 1, 2));
        shuffled.add(record("c2", 20, "eve", "a", 3, 1));

        let ids: Vec<_> = shuffled.history().iter().map(CommitRecord::id).collect();
        assert_eq!(ids, ["c1", "c2", "c3"]);
        assert_eq!(shuffled, in_order);
    }

    #[test]
    fn test_age() {
        let mut file = FileStatistics::new("a");
        file.add(record("c1", 0, "bob", "a", 1, 0));
        file.add(record("c2", 3 * SECONDS_PER_DAY, "bob", "a", 1, 0));
        let now = Utc.timestamp_opt(10 * SECONDS_PER_DAY + 5, 0).unwrap();
        assert_eq!(file.age_in_days(now), 10);
        assert_eq!(file.days_since_last_commit(now), 7);
        assert_eq!(FileStatistics::new("empty").age_in_days(now), 0);
    }

    #[test]
    fn test_rename_continues_history() {
        let mut stats = RepositoryStatistics::new();
        stats.add_all(vec![
            record("c1", 1, "bob", "A", 10, 0),
            record("c2", 2, "alice", "A", 4, 2),
            record("c3", 3, "bob", "B", 0, 0).renamed_from("A"),
            record("c4", 4, "carol", "B", 6, 1),
        ]);

        assert!(stats.history_of("A").is_none());
        let b = stats.get("B").unwrap();
        let ids: Vec<_> = b.history().iter().map(CommitRecord::id).collect();
        assert_eq!(ids, ["c1", "c2", "c3", "c4"]);
        assert_eq!(b.file_name(), "B");
        assert_eq!(b.author_count(), 3);
        assert_eq!(b.churn(), 23);
        assert_eq!(b.lines_of_code(), 17);
        assert_eq!(stats.total_commits(), 4);
        assert_eq!(stats.len(), 1);
    }

    #[test]
    fn test_rename_chain_keeps_full_history() {
        let mut stats = RepositoryStatistics::new();
        stats.add_all(vec![
            record("c1", 1, "bob", "A", 10, 0),
            record("c2", 2, "alice", "B", 0, 0).renamed_from("A"),
            record("c3", 3, "bob", "B", 2, 1),
            record("c4", 4, "carol", "C", 0, 0).renamed_from("B"),
            record("c5", 5, "carol", "C", 1, 0),
        ]);

        assert!(stats.history_of("A").is_none());
        assert!(stats.history_of("B").is_none());
        let c = stats.get("C").unwrap();
        let ids: Vec<_> = c.history().iter().map(CommitRecord::id).collect();
        assert_eq!(ids, ["c1", "c2", "c3", "c4", "c5"]);
        assert_eq!(c.file_name(), "C");
        assert_eq!(c.author_count(), 3);
        assert_eq!(c.lines_of_code(), 12);
        assert_eq!(c.churn(), 14);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats.total_commits(), 5);
    }

    #[test]
    fn test_rename_onto_existing_entry_merges_histories() {
        let mut stats = RepositoryStatistics::new();
        stats.add_all(vec![
            record("c1", 1, "bob", "B", 3, 0),
            record("c2", 2, "bob", "B", 0, 3).deleting(),
            record("c3", 3, "eve", "A", 8, 0),
            record("c4", 4, "eve", "B", 0, 0).renamed_from("A"),
        ]);

        let b = stats.get("B").unwrap();
        assert_eq!(b.commit_count(), 4);
        assert_eq!(b.lines_of_code(), 8);
        assert_eq!(stats.total_commits(), 4);
        assert!(!stats.contains("A"));
    }

    #[test]
    fn test_unknown_rename_source_starts_new_entry() {
        let mut stats = RepositoryStatistics::new();
        stats.add(record("c1", 1, "bob", "B", 2, 0).renamed_from("gone"));
        assert_eq!(stats.get("B").map(FileStatistics::commit_count), Some(1));
    }

    #[test]
    fn test_deleted_file_is_tombstoned_and_can_return() {
        let mut stats = RepositoryStatistics::new();
        stats.add_all(vec![
            record("c1", 1, "bob", "a.txt", 10, 0),
            record("c2", 1, "bob", "b.txt", 4, 0),
            record("c3", 2, "bob", "a.txt", 0, 10).deleting(),
        ]);

        assert!(!stats.contains("a.txt"));
        assert!(stats.history_of("a.txt").unwrap().is_deleted());
        assert_eq!(stats.len(), 1);
        assert_eq!(stats.total_lines_of_code(), 4);
        assert_eq!(stats.total_churn(), 24);
        assert_eq!(stats.total_commits(), 3);

        stats.add(record("c4", 3, "alice", "a.txt", 2, 0));
        let revived = stats.get("a.txt").unwrap();
        assert_eq!(revived.commit_count(), 3);
        assert_eq!(revived.lines_of_code(), 2);
        assert_eq!(stats.len(), 2);
    }

    #[test]
    fn test_add_all_from_copies_entries() {
        let mut previous = RepositoryStatistics::with_latest_commit("c1");
        previous.add(record("c1", 1, "bob", "a", 1, 0));

        let mut current = RepositoryStatistics::with_latest_commit("c2");
        current.add_all_from(&previous);
        current.add(record("c2", 2, "bob", "a", 1, 0));

        assert_eq!(previous.get("a").unwrap().commit_count(), 1);
        assert_eq!(current.get("a").unwrap().commit_count(), 2);
    }

    #[test]
    fn test_snapshot_persistence() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("state").join("forensics.json");

        assert_eq!(RepositoryStatistics::load(&path)?, RepositoryStatistics::new());

        let mut stats = RepositoryStatistics::with_latest_commit("c3");
        stats.add_all(vec![
            record("c1", 1, "bob", "A", 10, 0),
            record("c2", 2, "bob", "B", 0, 0).renamed_from("A"),
            record("c3", 3, "eve", "C", 0, 0).deleting(),
        ]);
        stats.save(&path)?;

        let loaded = RepositoryStatistics::load(&path)?;
        assert_eq!(loaded, stats);
        assert_eq!(loaded.latest_commit_id(), "c3");
        assert_eq!(loaded.get("B").unwrap().lines_of_code(), 10);
        Ok(())
    }

    #[test]
    fn test_malformed_snapshot_is_an_error() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json")?;
        assert!(matches!(
            RepositoryStatistics::load(&path),
            Err(SnapshotError::Json(_))
        ));
        Ok(())
    }
}

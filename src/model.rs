// src/model.rs

use serde::{Deserialize, Serialize};

/// Commit time in seconds since the Unix epoch
pub type Timestamp = i64;

/// Author used when a commit carries neither an e-mail nor a name
pub const UNKNOWN_AUTHOR: &str = "unknown";

/// One commit's effect on one file, as reported by the revision-control client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitDiff {
    pub commit_id: String,
    pub timestamp: Timestamp,
    pub author_name: String,
    pub author_email: String,
    pub path: String,
    pub added_lines: usize,
    pub deleted_lines: usize,
    pub is_delete: bool,
    pub renamed_from: Option<String>,
}

/// Immutable, normalized record of one commit touching one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    id: String,
    timestamp: Timestamp,
    author: String,
    path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    old_path: Option<String>,
    added_lines: usize,
    deleted_lines: usize,
    #[serde(default)]
    is_delete: bool,
}

impl CommitRecord {
    pub fn new(
        id: impl Into<String>,
        timestamp: Timestamp,
        author: impl Into<String>,
        path: impl Into<String>,
        added_lines: usize,
        deleted_lines: usize,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp,
            author: author.into(),
            path: path.into(),
            old_path: None,
            added_lines,
            deleted_lines,
            is_delete: false,
        }
    }

    /// Marks this record as the deletion of its file. A deletion never adds lines.
    pub fn deleting(mut self) -> Self {
        self.is_delete = true;
        self.added_lines = 0;
        self
    }

    /// Marks this record as a rename from `old_path` to the record's path.
    pub fn renamed_from(mut self, old_path: impl Into<String>) -> Self {
        let old_path = old_path.into();
        self.old_path = (old_path != self.path).then_some(old_path);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn old_path(&self) -> Option<&str> {
        self.old_path.as_deref()
    }

    pub fn added_lines(&self) -> usize {
        self.added_lines
    }

    pub fn deleted_lines(&self) -> usize {
        self.deleted_lines
    }

    pub fn is_delete(&self) -> bool {
        self.is_delete
    }

    pub fn is_rename(&self) -> bool {
        self.old_path.is_some()
    }
}

impl From<CommitDiff> for CommitRecord {
    fn from(diff: CommitDiff) -> Self {
        let author = normalize_author(&diff.author_name, &diff.author_email);
        let mut record = CommitRecord::new(
            diff.commit_id,
            diff.timestamp,
            author,
            diff.path,
            diff.added_lines,
            diff.deleted_lines,
        );
        if let Some(old_path) = diff.renamed_from {
            record = record.renamed_from(old_path);
        }
        if diff.is_delete {
            record = record.deleting();
        }
        record
    }
}

/// Stable author identity: the e-mail when present, otherwise the name.
fn normalize_author(name: &str, email: &str) -> String {
    let email = email.trim();
    if !email.is_empty() {
        return email.to_lowercase();
    }
    let name = name.trim();
    if name.is_empty() {
        UNKNOWN_AUTHOR.to_string()
    } else {
        name.to_string()
    }
}

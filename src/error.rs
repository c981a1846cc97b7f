// src/error.rs

use thiserror::Error;

/// Failures of the revision-control client while collecting commits
#[derive(Error, Debug)]
pub enum CollectError {
    #[error("commit collection was cancelled")]
    Cancelled,

    #[error("git repository is not readable: {0}")]
    Repository(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A mining pass was aborted by the host
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("mining was cancelled")]
pub struct Cancelled;

/// Failures while loading or storing a statistics snapshot
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

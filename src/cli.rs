// src/cli.rs

use crate::report::SortColumn;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the git repository to mine
    #[arg(short, long, env = "GIT_FORENSICS_REPO", default_value = ".")]
    pub repo: PathBuf,

    /// Snapshot of the previous run, updated in place
    /// [default: <repo>/.git/forensics.json]
    #[arg(short, long, env = "GIT_FORENSICS_STATE")]
    pub state: Option<PathBuf>,

    /// Number of files to list
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Column to sort the file list by (descending)
    #[arg(long, value_enum, default_value_t = SortColumn::Churn)]
    pub sort: SortColumn,

    /// Mine and report without storing the new snapshot
    #[arg(long)]
    pub dry_run: bool,
}

impl Args {
    pub fn state_path(&self) -> PathBuf {
        self.state
            .clone()
            .unwrap_or_else(|| self.repo.join(".git").join("forensics.json"))
    }
}

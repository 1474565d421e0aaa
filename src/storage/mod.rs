//! Storage module for persisted job postings
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Dedup-safe batch persistence keyed by posting URL
//! - Filtered queries for downstream consumers
//! - Crawl run tracking

mod query;
mod schema;
mod sqlite;
mod traits;

pub use query::{FilterColumn, JobQuery, SortField, SortOrder};
pub use sqlite::{format_timestamp, SqliteJobStore};
pub use traits::{JobStore, StorageError, StorageResult};

use crate::models::JobRecord;
use std::path::Path;

/// Opens (creating if needed) the job database at `path`
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteJobStore)` - Store with its schema in place
/// * `Err(StorageError)` - Failed to open or initialize the database
pub fn open_store(path: &Path) -> StorageResult<SqliteJobStore> {
    SqliteJobStore::new(path)
}

/// Counts produced by one `save` call
///
/// `saved` counts rows actually inserted. `duplicates` are valid records whose
/// URL was already stored; `dropped` failed validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub saved: usize,
    pub duplicates: usize,
    pub dropped: usize,
}

/// A save report together with the rows it inserted, in batch order
#[derive(Debug, Clone, Default)]
pub struct SaveOutcome {
    pub report: SaveReport,
    pub inserted: Vec<JobRecord>,
}

/// Totals recorded when a crawl run finishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub scraped: usize,
    pub saved: usize,
    pub dropped: usize,
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub scraped: u64,
    pub saved: u64,
    pub dropped: u64,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_db_string())
    }
}

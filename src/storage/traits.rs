//! Storage traits and error types

use crate::models::{JobRecord, RawJob};
use crate::storage::{
    FilterColumn, JobQuery, RunCounts, RunRecord, RunStatus, SaveOutcome, SaveReport,
};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Invalid timestamp '{0}' in database")]
    InvalidTimestamp(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persisted set of job postings and crawl runs
///
/// Implementations must make "insert if absent" a single atomic operation:
/// two callers racing on the same URL insert it exactly once.
pub trait JobStore: Send + Sync {
    /// Ensures the persistent structure exists; a no-op when it already does
    fn initialize(&self) -> StorageResult<()>;

    /// Validates and inserts a batch, skipping URLs that are already stored
    ///
    /// Invalid records are dropped and counted. Each inserted row is stamped
    /// with the store's clock at insertion time. Existing rows are never
    /// updated.
    fn save(&self, jobs: &[RawJob]) -> StorageResult<SaveReport> {
        self.save_returning(jobs).map(|outcome| outcome.report)
    }

    /// Like [`JobStore::save`], also returning the rows that were inserted
    fn save_returning(&self, jobs: &[RawJob]) -> StorageResult<SaveOutcome>;

    /// Records matching `query`, in its sort order
    fn query(&self, query: &JobQuery) -> StorageResult<Vec<JobRecord>>;

    /// Total number of stored postings
    fn count(&self) -> StorageResult<u64>;

    /// Distinct non-empty values of a filterable column, sorted
    fn distinct_values(&self, column: FilterColumn) -> StorageResult<Vec<String>>;

    /// Postings scraped at or after `since`
    fn count_since(&self, since: DateTime<Utc>) -> StorageResult<u64>;

    fn count_distinct_companies(&self) -> StorageResult<u64>;

    /// Posting count per source, largest first
    fn counts_by_source(&self) -> StorageResult<Vec<(String, u64)>>;

    /// Companies with the most postings, largest first
    fn top_companies(&self, limit: usize) -> StorageResult<Vec<(String, u64)>>;

    // ===== Run Management =====

    /// Creates a new crawl run in the `running` state and returns its ID
    fn begin_run(&self, config_hash: &str) -> StorageResult<i64>;

    /// Marks a run finished with its final status and totals
    fn finish_run(&self, run_id: i64, status: RunStatus, counts: RunCounts) -> StorageResult<()>;

    /// Gets the most recently started run, if any
    fn latest_run(&self) -> StorageResult<Option<RunRecord>>;
}

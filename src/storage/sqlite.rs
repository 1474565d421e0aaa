//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the JobStore trait.

use crate::models::{non_empty, JobRecord, RawJob};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{JobStore, StorageError, StorageResult};
use crate::storage::{
    FilterColumn, JobQuery, RunCounts, RunRecord, RunStatus, SaveOutcome, SaveReport,
};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// SQLite storage backend
///
/// The connection sits behind a mutex so one store can be shared between
/// tasks; uniqueness is enforced by the `url` constraint, not by the lock.
pub struct SqliteJobStore {
    conn: Mutex<Connection>,
    clock: Clock,
}

impl SqliteJobStore {
    /// Creates a new SqliteJobStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteJobStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self::from_connection(conn))
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            clock: Arc::new(Utc::now),
        }
    }

    /// Replaces the clock used to stamp `scraped_at`
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Database("connection lock poisoned".to_string()))
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)().trunc_subsecs(6)
    }

    fn count_where(&self, sql: &str, param: Option<String>) -> StorageResult<u64> {
        let conn = self.lock()?;
        let count: i64 = match param {
            Some(p) => conn.query_row(sql, [p], |row| row.get(0))?,
            None => conn.query_row(sql, [], |row| row.get(0))?,
        };
        Ok(count as u64)
    }

    fn grouped_counts(&self, sql: &str, limit: i64) -> StorageResult<Vec<(String, u64)>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map([limit], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

/// Storage text form of a timestamp: RFC 3339, UTC, microseconds
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<JobRecord> {
    let scraped_at: String = row.get(10)?;
    let scraped_at = parse_timestamp(&scraped_at).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            10,
            Type::Text,
            Box::new(StorageError::InvalidTimestamp(scraped_at.clone())),
        )
    })?;

    Ok(JobRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        company: row.get(2)?,
        location: row.get(3)?,
        salary: row.get(4)?,
        experience: row.get(5)?,
        education: row.get(6)?,
        url: row.get(7)?,
        source: row.get(8)?,
        posted_date: row.get(9)?,
        scraped_at,
        keyword: row.get(11)?,
    })
}

fn row_to_run(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Running),
        scraped: row.get::<_, i64>(5)? as u64,
        saved: row.get::<_, i64>(6)? as u64,
        dropped: row.get::<_, i64>(7)? as u64,
    })
}

impl JobStore for SqliteJobStore {
    fn initialize(&self) -> StorageResult<()> {
        let conn = self.lock()?;
        initialize_schema(&conn)?;
        Ok(())
    }

    fn save_returning(&self, jobs: &[RawJob]) -> StorageResult<SaveOutcome> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut outcome = SaveOutcome::default();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO jobs
                    (title, company, location, salary, experience, education,
                     url, source, posted_date, scraped_at, keyword)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT(url) DO NOTHING",
            )?;

            for raw in jobs {
                let job = raw.normalized();
                if let Err(e) = job.validate() {
                    tracing::warn!("Dropping {} record: {}", job.source, e);
                    outcome.report.dropped += 1;
                    continue;
                }

                let scraped_at = self.now();
                let inserted = stmt.execute(params![
                    job.title,
                    job.company,
                    non_empty(&job.location),
                    non_empty(&job.salary),
                    non_empty(&job.experience),
                    non_empty(&job.education),
                    job.url,
                    job.source,
                    non_empty(&job.posted_date),
                    format_timestamp(&scraped_at),
                    job.keyword,
                ])?;

                if inserted == 1 {
                    let id = tx.last_insert_rowid();
                    outcome
                        .inserted
                        .push(JobRecord::from_raw(id, &job, scraped_at));
                    outcome.report.saved += 1;
                } else {
                    outcome.report.duplicates += 1;
                }
            }
        }

        tx.commit()?;

        tracing::info!(
            "Saved {} new jobs (out of {}; {} duplicates, {} dropped)",
            outcome.report.saved,
            jobs.len(),
            outcome.report.duplicates,
            outcome.report.dropped
        );

        Ok(outcome)
    }

    fn query(&self, query: &JobQuery) -> StorageResult<Vec<JobRecord>> {
        let (sql, values) = query.to_sql();
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_from_iter(values.iter()), row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn count(&self) -> StorageResult<u64> {
        self.count_where("SELECT COUNT(*) FROM jobs", None)
    }

    fn distinct_values(&self, column: FilterColumn) -> StorageResult<Vec<String>> {
        let col = column.as_sql();
        let sql = format!(
            "SELECT DISTINCT {col} FROM jobs WHERE {col} IS NOT NULL AND {col} != '' ORDER BY {col}"
        );
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let values = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(values)
    }

    fn count_since(&self, since: DateTime<Utc>) -> StorageResult<u64> {
        self.count_where(
            "SELECT COUNT(*) FROM jobs WHERE scraped_at >= ?1",
            Some(format_timestamp(&since)),
        )
    }

    fn count_distinct_companies(&self) -> StorageResult<u64> {
        self.count_where("SELECT COUNT(DISTINCT company) FROM jobs", None)
    }

    fn counts_by_source(&self) -> StorageResult<Vec<(String, u64)>> {
        self.grouped_counts(
            "SELECT source, COUNT(*) AS n FROM jobs GROUP BY source
             ORDER BY n DESC, source ASC LIMIT ?1",
            -1,
        )
    }

    fn top_companies(&self, limit: usize) -> StorageResult<Vec<(String, u64)>> {
        self.grouped_counts(
            "SELECT company, COUNT(*) AS n FROM jobs GROUP BY company
             ORDER BY n DESC, company ASC LIMIT ?1",
            limit as i64,
        )
    }

    // ===== Run Management =====

    fn begin_run(&self, config_hash: &str) -> StorageResult<i64> {
        let now = format_timestamp(&self.now());
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO crawl_runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn finish_run(&self, run_id: i64, status: RunStatus, counts: RunCounts) -> StorageResult<()> {
        let now = format_timestamp(&self.now());
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE crawl_runs
             SET status = ?1, finished_at = ?2, scraped = ?3, saved = ?4, dropped = ?5
             WHERE id = ?6",
            params![
                status.to_db_string(),
                now,
                counts.scraped as i64,
                counts.saved as i64,
                counts.dropped as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let conn = self.lock()?;
        let run = conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status, scraped, saved, dropped
                 FROM crawl_runs ORDER BY id DESC LIMIT 1",
                [],
                row_to_run,
            )
            .optional()?;
        Ok(run)
    }
}

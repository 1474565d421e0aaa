//! Database schema definitions
//!
//! Timestamps are stored as RFC 3339 UTC text with microsecond precision, so
//! lexical order matches chronological order.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Persisted postings, unique by URL
CREATE TABLE IF NOT EXISTS jobs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    company TEXT NOT NULL,
    location TEXT,
    salary TEXT,
    experience TEXT,
    education TEXT,
    url TEXT NOT NULL UNIQUE,
    source TEXT NOT NULL,
    posted_date TEXT,
    scraped_at TEXT NOT NULL,
    keyword TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_jobs_scraped_at ON jobs(scraped_at);
CREATE INDEX IF NOT EXISTS idx_jobs_source ON jobs(source);

-- Track crawl runs
CREATE TABLE IF NOT EXISTS crawl_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    scraped INTEGER NOT NULL DEFAULT 0,
    saved INTEGER NOT NULL DEFAULT 0,
    dropped INTEGER NOT NULL DEFAULT 0
);
"#;

/// Initializes the database schema
///
/// Safe to call on a database that already has the schema.
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

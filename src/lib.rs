//! Jobtide: a polite job-posting harvester
//!
//! This crate collects job postings from listing sites, normalizes them into
//! a common record shape, and persists only postings whose URL has never been
//! seen before.

pub mod adapters;
pub mod config;
pub mod crawler;
pub mod models;
pub mod notify;
pub mod output;
pub mod render;
pub mod storage;

use thiserror::Error;

/// Main error type for Jobtide operations
#[derive(Debug, Error)]
pub enum JobtideError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Notification error: {0}")]
    Notify(#[from] notify::NotifyError),

    /// The final batch could not be persisted. The batch is handed back so
    /// the caller can keep it instead of losing the crawl.
    #[error("Scraped {scraped} jobs but could not save them: {source}")]
    Unsaved {
        scraped: usize,
        batch: Vec<models::RawJob>,
        source: storage::StorageError,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Unknown site adapter: {0}")]
    UnknownSite(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),
}

/// Navigation failures for a single page; recoverable by skipping the page
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Request timeout for {url} after {secs}s")]
    Timeout { url: String, secs: u64 },

    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    #[error("Expected HTML from {url}, got {content_type}")]
    ContentMismatch { url: String, content_type: String },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("No page is open in this session")]
    NoPage,

    #[error("Render session is closed")]
    SessionClosed,

    #[error("Failed to start render session: {0}")]
    Session(String),

    #[error("Cannot build page URL: {0}")]
    InvalidUrl(String),
}

/// Failure to read one listing item; the item is skipped
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("Invalid selector '{0}'")]
    InvalidSelector(String),

    #[error("Missing element '{0}'")]
    MissingElement(&'static str),

    #[error("Element '{selector}' has no '{attribute}' attribute")]
    MissingAttribute {
        selector: &'static str,
        attribute: &'static str,
    },

    #[error("Cannot resolve '{href}': {reason}")]
    UnresolvableUrl { href: String, reason: String },
}

/// A record that is not eligible for persistence
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Required field '{field}' is empty (url: '{url}')")]
    MissingField { field: &'static str, url: String },

    #[error("URL '{0}' is not an absolute http(s) URL")]
    InvalidUrl(String),
}

/// Result type alias for Jobtide operations
pub type Result<T> = std::result::Result<T, JobtideError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlReport, Orchestrator, PaginationController};
pub use models::{JobRecord, RawJob};
pub use storage::{JobQuery, JobStore, SqliteJobStore};

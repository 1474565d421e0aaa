//! Statistics over the job database
//!
//! This module provides functionality for extracting and displaying
//! posting statistics from the storage layer.

use crate::storage::{JobStore, StorageResult};
use chrono::{DateTime, Duration, Utc};

/// How many companies are listed in the leaderboard
pub const TOP_COMPANY_LIMIT: usize = 10;

/// Job database statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobStatistics {
    /// Total number of stored postings
    pub total: u64,

    /// Postings scraped in the 24 hours before `now`
    pub recent: u64,

    /// Number of distinct companies
    pub unique_companies: u64,

    /// Posting count per source, largest first
    pub by_source: Vec<(String, u64)>,

    /// Companies with the most postings, largest first
    pub top_companies: Vec<(String, u64)>,
}

impl JobStatistics {
    /// Names of the top `n` companies
    pub fn top_company_names(&self, n: usize) -> Vec<String> {
        self.top_companies
            .iter()
            .take(n)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `store` - The storage backend to query
/// * `now` - Reference time for the 24 hour window
///
/// # Returns
///
/// * `Ok(JobStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics(store: &dyn JobStore, now: DateTime<Utc>) -> StorageResult<JobStatistics> {
    Ok(JobStatistics {
        total: store.count()?,
        recent: store.count_since(now - Duration::hours(24))?,
        unique_companies: store.count_distinct_companies()?,
        by_source: store.counts_by_source()?,
        top_companies: store.top_companies(TOP_COMPANY_LIMIT)?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &JobStatistics) {
    println!("=== Job Statistics ===\n");

    println!("Overview:");
    println!("  Total jobs: {}", stats.total);
    println!("  Recent (24h): {}", stats.recent);
    println!("  Companies: {}", stats.unique_companies);
    println!();

    if !stats.by_source.is_empty() {
        println!("Jobs by Source:");
        for (source, count) in &stats.by_source {
            let percentage = if stats.total > 0 {
                (*count as f64 / stats.total as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", source, count, percentage);
        }
        println!();
    }

    if !stats.top_companies.is_empty() {
        println!("Top {} Companies:", stats.top_companies.len());
        for (rank, (company, count)) in stats.top_companies.iter().enumerate() {
            println!("  {:>2}. {} ({})", rank + 1, company, count);
        }
    }
}

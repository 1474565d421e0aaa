//! Jobtide main entry point
//!
//! This is the command-line interface for the Jobtide job-posting harvester.

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser};
use jobtide::config::{load_config_with_hash, validate, Config, EngineKind};
use jobtide::crawler::run_crawl;
use jobtide::models::JobRecord;
use jobtide::notify::Notifier;
use jobtide::output::{export_to_dir, export_unsaved_to_dir, load_statistics, print_statistics};
use jobtide::storage::{open_store, FilterColumn, JobQuery, JobStore, StorageResult};
use jobtide::JobtideError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Jobtide: a polite job-posting harvester
///
/// Jobtide searches job listing sites for the configured keywords, stores
/// every posting it has not seen before, and can email a digest of the new
/// ones.
#[derive(Parser, Debug)]
#[command(name = "jobtide")]
#[command(version)]
#[command(about = "A polite job-posting harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "export", "summary"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export", "summary"])]
    stats: bool,

    /// Export stored postings as CSV and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "summary"])]
    export: bool,

    #[command(flatten)]
    filters: ExportFilters,

    /// Email the daily summary and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "export"])]
    summary: bool,

    /// Crawl these keywords instead of the configured ones (repeatable)
    #[arg(long = "keyword", value_name = "KEYWORD")]
    keywords: Vec<String>,

    /// Override the number of result pages per site
    #[arg(long, value_name = "N")]
    pages: Option<u32>,

    /// Do not email the new postings after the crawl
    #[arg(long)]
    no_notify: bool,
}

/// Narrow the rows written by --export
#[derive(Args, Debug, Default)]
struct ExportFilters {
    /// Only postings from this site
    #[arg(long, value_name = "SITE", requires = "export")]
    source: Option<String>,

    /// Only postings with exactly this location
    #[arg(long, value_name = "LOCATION", requires = "export")]
    location: Option<String>,

    /// Only postings with exactly this experience requirement
    #[arg(long, value_name = "EXPERIENCE", requires = "export")]
    experience: Option<String>,

    /// Only postings whose title or company contains this text
    #[arg(long, value_name = "TEXT", requires = "export")]
    search: Option<String>,

    /// Only postings scraped on or after this UTC date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", value_parser = parse_date, requires = "export")]
    from: Option<NaiveDate>,

    /// Only postings scraped on or before this UTC date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", value_parser = parse_date, requires = "export")]
    to: Option<NaiveDate>,
}

impl ExportFilters {
    fn to_query(&self) -> JobQuery {
        let mut query = JobQuery::new().scraped_between(self.from, self.to);
        if let Some(source) = &self.source {
            query = query.source(source.as_str());
        }
        if let Some(location) = &self.location {
            query = query.location(location.as_str());
        }
        if let Some(experience) = &self.experience {
            query = query.experience(experience.as_str());
        }
        if let Some(search) = &self.search {
            query = query.search(search.as_str());
        }
        query
    }

    /// Exact-match columns this filter set narrows on
    fn exact_columns(&self) -> Vec<FilterColumn> {
        let mut columns = Vec::new();
        if self.source.is_some() {
            columns.push(FilterColumn::Source);
        }
        if self.location.is_some() {
            columns.push(FilterColumn::Location);
        }
        if self.experience.is_some() {
            columns.push(FilterColumn::Experience);
        }
        columns
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD, got '{}': {}", value, e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    apply_overrides(&mut config, cli.keywords, cli.pages)?;

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.export {
        handle_export(&config, &cli.filters)?;
    } else if cli.summary {
        handle_summary(&config).await?;
    } else {
        handle_crawl(config, &config_hash, !cli.no_notify).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("jobtide=info,warn"),
            1 => EnvFilter::new("jobtide=debug,info"),
            2 => EnvFilter::new("jobtide=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Replaces keywords and page count from the command line, then re-validates
fn apply_overrides(
    config: &mut Config,
    keywords: Vec<String>,
    pages: Option<u32>,
) -> anyhow::Result<()> {
    if keywords.is_empty() && pages.is_none() {
        return Ok(());
    }

    if !keywords.is_empty() {
        config.crawler.keywords = keywords;
    }
    if let Some(pages) = pages {
        config.crawler.pages_per_site = pages;
    }

    validate(config).context("invalid command-line override")?;
    Ok(())
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Jobtide Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Keywords: {}", config.crawler.keywords.join(", "));
    println!("  Pages per site: {}", config.crawler.pages_per_site);
    println!(
        "  Max concurrent sessions: {}",
        config.crawler.max_concurrent_sessions
    );
    println!(
        "  Delays: settle {}ms, page {}ms, politeness {}ms",
        config.crawler.settle_delay_ms,
        config.crawler.page_delay_ms,
        config.crawler.politeness_delay_ms
    );
    let engine = match config.crawler.engine {
        EngineKind::Http => "http",
        EngineKind::Browser => "browser",
    };
    println!("  Engine: {}", engine);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Export directory: {}", config.output.export_dir);

    println!("\nSites ({}):", config.sites.len());
    for site in &config.sites {
        match &site.base_url {
            Some(base) => println!("  - {} ({})", site.name, base),
            None => println!("  - {}", site.name),
        }
    }

    match &config.notifier {
        Some(n) if n.enabled => println!("\nNotifier: {}:{}", n.smtp_server, n.smtp_port),
        _ => println!("\nNotifier: disabled"),
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would request up to {} listing pages",
        config.crawler.keywords.len()
            * config.sites.len()
            * config.crawler.pages_per_site as usize
    );
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let store = open_store(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&store, Utc::now())?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --export mode: writes the matching stored postings to a CSV file
fn handle_export(config: &Config, filters: &ExportFilters) -> anyhow::Result<()> {
    let store = open_store(Path::new(&config.output.database_path))?;
    let records = store.query(&filters.to_query())?;

    if records.is_empty() {
        for (column, values) in filter_choices(&store, filters)? {
            tracing::warn!(
                "No postings matched; known {} values: {}",
                column,
                values.join(", ")
            );
        }
    }

    let path = export_to_dir(&records, Path::new(&config.output.export_dir), Utc::now())?;
    println!("✓ Exported {} jobs to: {}", records.len(), path.display());

    Ok(())
}

/// Stored values for each exact-match column the filters use
fn filter_choices(
    store: &impl JobStore,
    filters: &ExportFilters,
) -> StorageResult<Vec<(&'static str, Vec<String>)>> {
    filters
        .exact_columns()
        .into_iter()
        .map(|column| {
            let name = match column {
                FilterColumn::Source => "source",
                FilterColumn::Location => "location",
                FilterColumn::Experience => "experience",
                FilterColumn::Keyword => "keyword",
            };
            Ok((name, store.distinct_values(column)?))
        })
        .collect()
}

/// Handles the --summary mode: emails the daily summary
async fn handle_summary(config: &Config) -> anyhow::Result<()> {
    let Some(notifier_config) = config.notifier.as_ref().filter(|n| n.enabled) else {
        anyhow::bail!("no enabled [notifier] section in configuration");
    };

    let store = open_store(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&store, Utc::now())?;

    let notifier = Notifier::from_config(notifier_config)?;
    let status = notifier.send_daily_summary(&stats, stats.recent).await;
    println!("{}", status);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: &str, notify: bool) -> anyhow::Result<()> {
    tracing::info!(
        "Keywords: {}, Sites: {}, Pages per site: {}",
        config.crawler.keywords.len(),
        config.sites.len(),
        config.crawler.pages_per_site
    );

    let store = Arc::new(open_store(Path::new(&config.output.database_path))?);

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current page");
            signal_token.cancel();
        }
    });

    match run_crawl(&config, store, config_hash, cancel).await {
        Ok(report) => {
            tracing::info!(
                "Crawl {} (run {}): scraped {}, saved {}, duplicates {}, dropped {}, failed pages {}",
                if report.cancelled { "interrupted" } else { "completed" },
                report.run_id,
                report.scraped,
                report.saved,
                report.duplicates,
                report.dropped,
                report.pages_failed
            );

            if notify {
                send_notification(&config, &report.new_jobs).await;
            }
            Ok(())
        }
        Err(JobtideError::Unsaved {
            scraped,
            batch,
            source,
        }) => {
            tracing::error!("Save failed after scraping {} jobs: {}", scraped, source);
            match export_unsaved_to_dir(&batch, Path::new(&config.output.export_dir), Utc::now())
            {
                Ok(path) => tracing::warn!("Unsaved jobs written to {}", path.display()),
                Err(e) => tracing::error!("Could not keep unsaved jobs: {}", e),
            }
            Err(anyhow::anyhow!(
                "scraped {} jobs but could not save them: {}",
                scraped,
                source
            ))
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Emails the new postings; failures are logged and never fail the crawl
async fn send_notification(config: &Config, records: &[JobRecord]) {
    let Some(notifier_config) = config.notifier.as_ref().filter(|n| n.enabled) else {
        tracing::debug!("Notifier not configured");
        return;
    };

    match Notifier::from_config(notifier_config) {
        Ok(notifier) => {
            let status = notifier.notify_new_jobs(records).await;
            tracing::info!("{}", status);
        }
        Err(e) => tracing::warn!("Notifications disabled: {}", e),
    }
}

//! Crawler module for keyword-driven listing crawls
//!
//! This module contains the core crawling logic, including:
//! - Paging one adapter through its search results for one keyword
//! - Fanning keywords out across adapters under a session limit
//! - Pacing, cancellation and batch persistence

mod orchestrator;
mod pagination;

#[cfg(test)]
pub(crate) mod testutil;

pub use orchestrator::{CrawlReport, Orchestrator};
pub use pagination::{PacingConfig, PageCollection, PaginationController};

use crate::adapters::AdapterRegistry;
use crate::config::{Config, EngineKind};
use crate::render::{HttpRenderEngine, RenderEngine};
use crate::storage::JobStore;
use crate::JobtideError;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the adapter registry from the `[[site]]` entries
/// 2. Start the configured render engine
/// 3. Crawl every configured keyword across every site
/// 4. Save the aggregate to `store` in one batch
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `store` - Where new postings are persisted
/// * `config_hash` - Recorded with the crawl run
/// * `cancel` - Cancels the crawl cooperatively; collected records are still saved
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed (possibly with contained failures)
/// * `Err(JobtideError)` - The engine could not start or the store failed
pub async fn run_crawl<S: JobStore + 'static>(
    config: &Config,
    store: Arc<S>,
    config_hash: &str,
    cancel: CancellationToken,
) -> Result<CrawlReport, JobtideError> {
    let registry = Arc::new(AdapterRegistry::from_config(&config.sites)?);
    let timeout = Duration::from_secs(config.crawler.fetch_timeout_secs);

    match config.crawler.engine {
        EngineKind::Http => {
            let engine = HttpRenderEngine::new(&config.user_agent, timeout)?;
            run_with_engine(engine, config, registry, store, config_hash, cancel).await
        }
        EngineKind::Browser => {
            #[cfg(feature = "browser")]
            {
                let engine = crate::render::BrowserRenderEngine::launch(
                    &config.user_agent.header_value(),
                    timeout,
                )
                .await?;
                run_with_engine(engine, config, registry, store, config_hash, cancel).await
            }

            #[cfg(not(feature = "browser"))]
            {
                let _ = (registry, store, config_hash, cancel);
                Err(crate::ConfigError::Validation(
                    "engine = \"browser\" requires building with the `browser` feature"
                        .to_string(),
                )
                .into())
            }
        }
    }
}

async fn run_with_engine<E: RenderEngine, S: JobStore + 'static>(
    engine: E,
    config: &Config,
    registry: Arc<AdapterRegistry>,
    store: Arc<S>,
    config_hash: &str,
    cancel: CancellationToken,
) -> Result<CrawlReport, JobtideError> {
    let orchestrator = Orchestrator::new(
        engine,
        registry,
        store,
        PacingConfig::from(&config.crawler),
        config.crawler.max_concurrent_sessions as usize,
        cancel,
    )
    .with_config_hash(config_hash);

    orchestrator
        .run(&config.crawler.keywords, config.crawler.pages_per_site)
        .await
}

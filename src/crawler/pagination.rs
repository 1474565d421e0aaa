//! Pagination controller
//!
//! Drives one adapter across pages `1..=page_count` for one keyword inside a
//! single render session. A page that fails to load is logged and skipped;
//! the session is closed exactly once when the range is done, cancelled, or
//! abandoned.

use crate::adapters::SiteAdapter;
use crate::config::CrawlerConfig;
use crate::models::RawJob;
use crate::render::{RenderEngine, RenderSession};
use crate::FetchError;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Fixed delays used while crawling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingConfig {
    /// After a page opens, before it is read
    pub settle_delay: Duration,
    /// Between two pages of the same keyword
    pub page_delay: Duration,
    /// Between keywords
    pub politeness_delay: Duration,
}

impl PacingConfig {
    /// No waiting at all
    pub fn none() -> Self {
        Self {
            settle_delay: Duration::ZERO,
            page_delay: Duration::ZERO,
            politeness_delay: Duration::ZERO,
        }
    }
}

impl From<&CrawlerConfig> for PacingConfig {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            page_delay: Duration::from_millis(config.page_delay_ms),
            politeness_delay: Duration::from_millis(config.politeness_delay_ms),
        }
    }
}

/// What one `(keyword, adapter)` collection produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageCollection {
    pub jobs: Vec<RawJob>,
    pub pages_ok: u32,
    pub pages_failed: u32,
    pub cancelled: bool,
}

/// Sleeps for `delay` unless cancelled first; returns false on cancellation
pub(crate) async fn pause(delay: Duration, cancel: &CancellationToken) -> bool {
    if delay.is_zero() {
        return !cancel.is_cancelled();
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

pub struct PaginationController<E: RenderEngine> {
    engine: E,
    adapter: Arc<dyn SiteAdapter>,
    pacing: PacingConfig,
    cancel: CancellationToken,
}

impl<E: RenderEngine> PaginationController<E> {
    pub fn new(
        engine: E,
        adapter: Arc<dyn SiteAdapter>,
        pacing: PacingConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            engine,
            adapter,
            pacing,
            cancel,
        }
    }

    /// Collects listing items for `keyword` from pages `1..=page_count`
    ///
    /// Every returned record has its `keyword` set. Only failure to start the
    /// render session is an error; page failures are counted in
    /// [`PageCollection::pages_failed`].
    pub async fn collect(&self, keyword: &str, page_count: u32) -> Result<PageCollection, FetchError> {
        let source = self.adapter.name();
        let mut session = self
            .engine
            .start_session(&format!("{source}/{keyword}"))
            .await?;

        let collection = self.collect_pages(&mut session, keyword, page_count).await;
        session.close().await;

        tracing::info!(
            "{} '{}': {} jobs from {} pages ({} failed)",
            source,
            keyword,
            collection.jobs.len(),
            collection.pages_ok,
            collection.pages_failed
        );

        Ok(collection)
    }

    async fn collect_pages(
        &self,
        session: &mut E::Session,
        keyword: &str,
        page_count: u32,
    ) -> PageCollection {
        let source = self.adapter.name();
        let mut collection = PageCollection::default();

        for page in 1..=page_count {
            if page > 1 && !pause(self.pacing.page_delay, &self.cancel).await {
                collection.cancelled = true;
                break;
            }

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                result = self.load_page(session, keyword, page) => Some(result),
            };

            match result {
                None => {
                    collection.cancelled = true;
                    break;
                }
                Some(Ok(mut jobs)) => {
                    tracing::debug!("{} '{}' page {}: {} items", source, keyword, page, jobs.len());
                    for job in &mut jobs {
                        job.keyword = keyword.to_string();
                    }
                    collection.jobs.extend(jobs);
                    collection.pages_ok += 1;
                }
                Some(Err(e)) => {
                    tracing::warn!("{} '{}' page {} failed: {}", source, keyword, page, e);
                    collection.pages_failed += 1;
                }
            }
        }

        collection
    }

    async fn load_page(
        &self,
        session: &mut E::Session,
        keyword: &str,
        page: u32,
    ) -> Result<Vec<RawJob>, FetchError> {
        let url = self.adapter.page_url(keyword, page)?;
        tracing::info!("Fetching {} page {}: {}", self.adapter.name(), page, url);

        session.open(&url).await?;
        tokio::time::sleep(self.pacing.settle_delay).await;
        let snapshot = session.snapshot().await?;

        Ok(self.adapter.extract(&snapshot))
    }
}

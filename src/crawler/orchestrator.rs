//! Crawl orchestrator
//!
//! Fans keywords out across the registered adapters, aggregates the results
//! in a deterministic order, and persists the whole crawl in one batch.

use crate::adapters::AdapterRegistry;
use crate::crawler::pagination::{pause, PacingConfig, PageCollection, PaginationController};
use crate::models::{JobRecord, RawJob};
use crate::render::RenderEngine;
use crate::storage::{JobStore, RunCounts, RunStatus, SaveOutcome, StorageError};
use crate::{FetchError, JobtideError};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Summary of one crawl run
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    pub run_id: i64,
    /// Records collected across all keywords and adapters
    pub scraped: usize,
    /// Records newly inserted by the final save
    pub saved: usize,
    pub duplicates: usize,
    pub dropped: usize,
    /// `(keyword, adapter)` tasks that contributed nothing because they failed
    pub failed_tasks: usize,
    pub pages_failed: u32,
    pub cancelled: bool,
    /// The rows inserted by this run, in aggregation order
    pub new_jobs: Vec<JobRecord>,
}

/// Runs crawls for a set of keywords across all registered adapters
///
/// For each keyword, one task per adapter is started in registration order.
/// A semaphore permit is taken before each task starts, so at most
/// `max_sessions` render sessions are open at once; with one permit the crawl
/// is strictly sequential. Results are joined back in registration order.
pub struct Orchestrator<E: RenderEngine, S: JobStore + 'static> {
    engine: E,
    registry: Arc<AdapterRegistry>,
    store: Arc<S>,
    pacing: PacingConfig,
    limiter: Arc<Semaphore>,
    cancel: CancellationToken,
    config_hash: String,
}

impl<E: RenderEngine, S: JobStore + 'static> Orchestrator<E, S> {
    pub fn new(
        engine: E,
        registry: Arc<AdapterRegistry>,
        store: Arc<S>,
        pacing: PacingConfig,
        max_sessions: usize,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            engine,
            registry,
            store,
            pacing,
            limiter: Arc::new(Semaphore::new(max_sessions.max(1))),
            cancel,
            config_hash: String::new(),
        }
    }

    /// Records `hash` as the configuration of every run started by this orchestrator
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = hash.into();
        self
    }

    /// Crawls every keyword and saves the aggregate
    ///
    /// Page, item and task failures are contained and counted. The run fails
    /// only if the store cannot record the run or save the batch; in the
    /// latter case the batch is returned inside [`JobtideError::Unsaved`].
    pub async fn run(&self, keywords: &[String], pages_per_site: u32) -> Result<CrawlReport, JobtideError> {
        let run_id = self.store.begin_run(&self.config_hash)?;
        tracing::info!(
            "Starting crawl run {}: {} keywords x {} sites, {} pages each",
            run_id,
            keywords.len(),
            self.registry.len(),
            pages_per_site
        );

        let mut report = CrawlReport {
            run_id,
            ..CrawlReport::default()
        };
        let mut batch: Vec<RawJob> = Vec::new();

        for (index, keyword) in keywords.iter().enumerate() {
            if index > 0 && !pause(self.pacing.politeness_delay, &self.cancel).await {
                break;
            }
            if self.cancel.is_cancelled() {
                break;
            }

            tracing::info!("Crawling keyword '{}'", keyword);
            self.crawl_keyword(keyword, pages_per_site, &mut batch, &mut report)
                .await;
        }

        report.cancelled |= self.cancel.is_cancelled();
        report.scraped = batch.len();

        let status = if report.cancelled {
            tracing::warn!("Crawl cancelled; saving {} collected records", batch.len());
            RunStatus::Interrupted
        } else {
            RunStatus::Completed
        };

        match self.save_batch(batch).await {
            (_, Ok(outcome)) => {
                report.saved = outcome.report.saved;
                report.duplicates = outcome.report.duplicates;
                report.dropped = outcome.report.dropped;
                report.new_jobs = outcome.inserted;
                self.finish(run_id, status, &report);

                tracing::info!(
                    "Crawl run {} finished: scraped {}, saved {}",
                    run_id,
                    report.scraped,
                    report.saved
                );
                Ok(report)
            }
            (batch, Err(source)) => {
                tracing::error!(
                    "Failed to save {} scraped records: {}",
                    report.scraped,
                    source
                );
                self.finish(run_id, RunStatus::Failed, &report);
                Err(JobtideError::Unsaved {
                    scraped: report.scraped,
                    batch,
                    source,
                })
            }
        }
    }

    async fn crawl_keyword(
        &self,
        keyword: &str,
        pages: u32,
        batch: &mut Vec<RawJob>,
        report: &mut CrawlReport,
    ) {
        let mut tasks: Vec<(&'static str, JoinHandle<Result<PageCollection, FetchError>>)> =
            Vec::with_capacity(self.registry.len());

        for adapter in self.registry.adapters() {
            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                permit = Arc::clone(&self.limiter).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let controller = PaginationController::new(
                self.engine.clone(),
                Arc::clone(adapter),
                self.pacing,
                self.cancel.clone(),
            );
            let keyword = keyword.to_string();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                controller.collect(&keyword, pages).await
            });
            tasks.push((adapter.name(), handle));
        }

        for (source, handle) in tasks {
            match handle.await {
                Ok(Ok(collection)) => {
                    report.pages_failed += collection.pages_failed;
                    report.cancelled |= collection.cancelled;
                    batch.extend(collection.jobs);
                }
                Ok(Err(e)) => {
                    tracing::warn!("{} '{}' contributed no records: {}", source, keyword, e);
                    report.failed_tasks += 1;
                }
                Err(e) => {
                    tracing::error!("{} '{}' task aborted: {}", source, keyword, e);
                    report.failed_tasks += 1;
                }
            }
        }
    }

    /// Saves on a blocking thread; the batch is always handed back
    async fn save_batch(
        &self,
        batch: Vec<RawJob>,
    ) -> (Vec<RawJob>, Result<SaveOutcome, StorageError>) {
        let store = Arc::clone(&self.store);
        let task = tokio::task::spawn_blocking(move || {
            // A panicking store must not take the batch down with it.
            let result = panic::catch_unwind(AssertUnwindSafe(|| store.save_returning(&batch)))
                .unwrap_or_else(|_| {
                    Err(StorageError::Database("save panicked".to_string()))
                });
            (batch, result)
        });

        match task.await {
            Ok(done) => done,
            Err(e) => {
                tracing::error!("Save task did not complete; batch is lost: {}", e);
                (
                    Vec::new(),
                    Err(StorageError::Database(format!("save task failed: {e}"))),
                )
            }
        }
    }

    fn finish(&self, run_id: i64, status: RunStatus, report: &CrawlReport) {
        let counts = RunCounts {
            scraped: report.scraped,
            saved: report.saved,
            dropped: report.dropped,
        };
        if let Err(e) = self.store.finish_run(run_id, status, counts) {
            tracing::warn!("Failed to record end of run {}: {}", run_id, e);
        }
    }
}

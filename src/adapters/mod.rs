//! Site extraction adapters
//!
//! Each listing site gets one [`SiteAdapter`]: it knows how to build the
//! search URL for a keyword and page, and how to turn one listing item on a
//! rendered page into a [`RawJob`]. A malformed item is logged and skipped;
//! it never fails the page.

mod jobkorea;
mod saramin;

pub use jobkorea::JobKoreaAdapter;
pub use saramin::SaraminAdapter;

use crate::config::SiteConfig;
use crate::models::RawJob;
use crate::render::{dom, RenderedPage};
use crate::{ConfigError, ExtractionError, FetchError};
use scraper::ElementRef;
use std::sync::Arc;
use url::Url;

/// Adapter names accepted in `[[site]]` entries
pub const KNOWN_SITES: &[&str] = &["saramin", "jobkorea"];

/// Extraction rules for one listing site
pub trait SiteAdapter: Send + Sync {
    /// Source label written into every record, e.g. "Saramin"
    fn name(&self) -> &'static str;

    /// Origin that site-relative links are resolved against
    fn base_url(&self) -> &Url;

    /// Search-result URL for `keyword` on the 1-based `page`
    fn page_url(&self, keyword: &str, page: u32) -> Result<Url, FetchError>;

    /// CSS selector matching one listing item
    fn item_selector(&self) -> &'static str;

    /// Reads one listing item
    fn parse_item(&self, item: ElementRef<'_>) -> Result<RawJob, ExtractionError>;

    /// Extracts every readable listing item from a rendered page
    ///
    /// Items that fail to parse are logged and skipped. The returned records
    /// carry this adapter's source label; the keyword is left for the caller.
    fn extract(&self, page: &RenderedPage) -> Vec<RawJob> {
        let selector = match dom::selector(self.item_selector()) {
            Ok(selector) => selector,
            Err(e) => {
                tracing::warn!("{}: {}", self.name(), e);
                return Vec::new();
            }
        };

        let document = page.document();
        let items = dom::query_document(&document, &selector);
        let mut jobs = Vec::with_capacity(items.len());

        for (index, item) in items.into_iter().enumerate() {
            match self.parse_item(item) {
                Ok(mut job) => {
                    job.source = self.name().to_string();
                    jobs.push(job);
                }
                Err(e) => {
                    tracing::warn!(
                        "{}: skipping item {} on {}: {}",
                        self.name(),
                        index + 1,
                        page.url(),
                        e
                    );
                }
            }
        }

        jobs
    }
}

/// Builds the adapter registered under `name` (case-insensitive)
pub fn build_adapter(
    name: &str,
    base_url: Option<&str>,
) -> Result<Arc<dyn SiteAdapter>, ConfigError> {
    let key = name.to_ascii_lowercase();
    let default_base = match key.as_str() {
        "saramin" => SaraminAdapter::DEFAULT_BASE_URL,
        "jobkorea" => JobKoreaAdapter::DEFAULT_BASE_URL,
        _ => return Err(ConfigError::UnknownSite(name.to_string())),
    };

    let raw = base_url.unwrap_or(default_base);
    let base = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url '{}': {}", raw, e)))?;

    let adapter: Arc<dyn SiteAdapter> = match key.as_str() {
        "saramin" => Arc::new(SaraminAdapter::new(base)),
        _ => Arc::new(JobKoreaAdapter::new(base)),
    };
    Ok(adapter)
}

/// Adapters in registration order
///
/// Registration order is the order results are aggregated in for every
/// keyword.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn SiteAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the registry from `[[site]]` entries, in file order
    pub fn from_config(sites: &[SiteConfig]) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        for site in sites {
            registry.register(build_adapter(&site.name, site.base_url.as_deref())?);
        }
        Ok(registry)
    }

    pub fn register(&mut self, adapter: Arc<dyn SiteAdapter>) {
        self.adapters.push(adapter);
    }

    pub fn adapters(&self) -> &[Arc<dyn SiteAdapter>] {
        &self.adapters
    }

    /// Looks up an adapter by source label (case-insensitive)
    pub fn get(&self, name: &str) -> Option<Arc<dyn SiteAdapter>> {
        self.adapters
            .iter()
            .find(|a| a.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.adapters.iter().map(|a| a.name()))
            .finish()
    }
}

//! Test utilities: a scripted render engine and a minimal adapter.
//!
//! The engine serves canned HTML per URL and records every call so tests can
//! assert on navigation order, session lifetimes and concurrency.

use crate::adapters::SiteAdapter;
use crate::models::RawJob;
use crate::render::{dom, RenderEngine, RenderSession, RenderedPage};
use crate::{ExtractionError, FetchError};
use scraper::ElementRef;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

// ---------------------------------------------------------------------------
// TestAdapter
// ---------------------------------------------------------------------------

/// Adapter for `<li class="job">` listings served from `https://<name>.example`
pub struct TestAdapter {
    name: &'static str,
    base_url: Url,
}

impl TestAdapter {
    pub fn new(name: &'static str) -> Self {
        let base_url = Url::parse(&format!("https://{}.example", name.to_ascii_lowercase()))
            .expect("test adapter name must form a host");
        Self { name, base_url }
    }
}

impl SiteAdapter for TestAdapter {
    fn name(&self) -> &'static str {
        self.name
    }

    fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn page_url(&self, keyword: &str, page: u32) -> Result<Url, FetchError> {
        let mut url = self
            .base_url
            .join("/search")
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("q", keyword)
            .append_pair("page", &page.to_string());
        Ok(url)
    }

    fn item_selector(&self) -> &'static str {
        "li.job"
    }

    fn parse_item(&self, item: ElementRef<'_>) -> Result<RawJob, ExtractionError> {
        let link = dom::query_first(item, &dom::selector("a")?)
            .ok_or(ExtractionError::MissingElement("a"))?;
        let href = dom::attribute(link, "href").ok_or(ExtractionError::MissingAttribute {
            selector: "a",
            attribute: "href",
        })?;
        let company = dom::query_first(item, &dom::selector(".company")?)
            .map(dom::text)
            .filter(|c| !c.is_empty())
            .ok_or(ExtractionError::MissingElement(".company"))?;

        Ok(RawJob {
            title: dom::text(link),
            company,
            url: dom::resolve_url(&self.base_url, &href)?.to_string(),
            ..RawJob::default()
        })
    }
}

/// Listing HTML with one item per id
pub fn listing_html(ids: &[&str]) -> String {
    let items: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<li class="job"><a href="/job/{id}">Job {id}</a><span class="company">Company {id}</span></li>"#
            )
        })
        .collect();
    format!("<html><body><ul>{items}</ul></body></html>")
}

// ---------------------------------------------------------------------------
// ScriptedEngine
// ---------------------------------------------------------------------------

#[derive(Default)]
struct EngineState {
    pages: HashMap<String, Result<String, FetchError>>,
    opened: Vec<String>,
    opened_at: Vec<Instant>,
    snapshot_at: Vec<Instant>,
    refuse_sessions: bool,
    sessions_started: usize,
    sessions_closed: usize,
    live_sessions: usize,
    max_live_sessions: usize,
}

/// Render engine that serves scripted pages; unscripted URLs answer HTTP 404
#[derive(Clone, Default)]
pub struct ScriptedEngine {
    state: Arc<Mutex<EngineState>>,
    open_delay: Duration,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn url_for(site: &'static str, keyword: &str, page: u32) -> String {
        TestAdapter::new(site)
            .page_url(keyword, page)
            .expect("test page url")
            .to_string()
    }

    /// Scripts a listing page containing the given item ids
    pub fn page(self, site: &'static str, keyword: &str, page: u32, ids: &[&str]) -> Self {
        self.page_html(site, keyword, page, &listing_html(ids))
    }

    pub fn page_html(self, site: &'static str, keyword: &str, page: u32, html: &str) -> Self {
        let url = Self::url_for(site, keyword, page);
        self.state
            .lock()
            .unwrap()
            .pages
            .insert(url, Ok(html.to_string()));
        self
    }

    /// Scripts a navigation timeout for one page
    pub fn fail(self, site: &'static str, keyword: &str, page: u32) -> Self {
        let url = Self::url_for(site, keyword, page);
        let error = FetchError::Timeout {
            url: url.clone(),
            secs: 30,
        };
        self.state.lock().unwrap().pages.insert(url, Err(error));
        self
    }

    pub fn refuse_sessions(self) -> Self {
        self.state.lock().unwrap().refuse_sessions = true;
        self
    }

    /// Makes every `open` take this long
    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = delay;
        self
    }

    /// URLs opened so far, in call order
    pub fn opened(&self) -> Vec<String> {
        self.state.lock().unwrap().opened.clone()
    }

    /// When each `open` was called, in call order
    pub fn open_times(&self) -> Vec<Instant> {
        self.state.lock().unwrap().opened_at.clone()
    }

    /// When each `snapshot` was taken, in call order
    pub fn snapshot_times(&self) -> Vec<Instant> {
        self.state.lock().unwrap().snapshot_at.clone()
    }

    pub fn sessions_started(&self) -> usize {
        self.state.lock().unwrap().sessions_started
    }

    pub fn sessions_closed(&self) -> usize {
        self.state.lock().unwrap().sessions_closed
    }

    /// Sessions started and not yet closed or dropped
    pub fn live_sessions(&self) -> usize {
        self.state.lock().unwrap().live_sessions
    }

    pub fn max_live_sessions(&self) -> usize {
        self.state.lock().unwrap().max_live_sessions
    }
}

impl RenderEngine for ScriptedEngine {
    type Session = ScriptedSession;

    async fn start_session(&self, _label: &str) -> Result<ScriptedSession, FetchError> {
        let mut state = self.state.lock().unwrap();
        if state.refuse_sessions {
            return Err(FetchError::Session("browser unavailable".to_string()));
        }
        state.sessions_started += 1;
        state.live_sessions += 1;
        state.max_live_sessions = state.max_live_sessions.max(state.live_sessions);

        Ok(ScriptedSession {
            state: Arc::clone(&self.state),
            open_delay: self.open_delay,
            current: None,
            closed: false,
        })
    }
}

pub struct ScriptedSession {
    state: Arc<Mutex<EngineState>>,
    open_delay: Duration,
    current: Option<RenderedPage>,
    closed: bool,
}

impl ScriptedSession {
    fn release(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.current = None;
        if let Ok(mut state) = self.state.lock() {
            state.sessions_closed += 1;
            state.live_sessions -= 1;
        }
    }
}

impl Drop for ScriptedSession {
    fn drop(&mut self) {
        self.release();
    }
}

impl RenderSession for ScriptedSession {
    async fn open(&mut self, url: &Url) -> Result<(), FetchError> {
        if self.closed {
            return Err(FetchError::SessionClosed);
        }
        self.current = None;

        let scripted = {
            let mut state = self.state.lock().unwrap();
            state.opened.push(url.to_string());
            state.opened_at.push(Instant::now());
            state.pages.get(url.as_str()).cloned()
        };

        if !self.open_delay.is_zero() {
            tokio::time::sleep(self.open_delay).await;
        }

        match scripted {
            Some(Ok(html)) => {
                self.current = Some(RenderedPage::new(url.clone(), html));
                Ok(())
            }
            Some(Err(e)) => Err(e),
            None => Err(FetchError::Http {
                url: url.to_string(),
                status: 404,
            }),
        }
    }

    async fn snapshot(&mut self) -> Result<RenderedPage, FetchError> {
        if self.closed {
            return Err(FetchError::SessionClosed);
        }
        self.state.lock().unwrap().snapshot_at.push(Instant::now());
        self.current.clone().ok_or(FetchError::NoPage)
    }

    async fn close(&mut self) {
        self.release();
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

use crate::render::{RenderEngine, RenderSession, RenderedPage};
use crate::FetchError;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Headless Chromium render engine
///
/// One Chromium process is shared by every clone of the engine. Each session
/// owns at most one tab at a time; opening a new URL closes the previous tab.
#[derive(Clone)]
pub struct BrowserRenderEngine {
    browser: Arc<Browser>,
    timeout: Duration,
}

impl BrowserRenderEngine {
    /// Launches headless Chromium
    ///
    /// Requires a Chromium or Chrome binary reachable via `$PATH`, a
    /// well-known install location, or `CHROME_BIN`.
    pub async fn launch(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let mut builder = BrowserConfig::builder().no_sandbox().disable_default_args();

        if let Some(bin) = find_chrome_binary() {
            tracing::info!("Using Chrome binary: {}", bin.display());
            builder = builder.chrome_executable(bin);
        }

        let config = builder
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--no-first-run")
            .arg(format!("--user-agent={user_agent}"))
            .build()
            .map_err(|e| FetchError::Session(format!("Browser config error: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::Session(format!("Failed to launch browser: {e}")))?;

        // The CDP handler must be polled for the connection to make progress.
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    tracing::warn!("Browser CDP handler error: {event:?}");
                    break;
                }
            }
        });

        Ok(Self {
            browser: Arc::new(browser),
            timeout,
        })
    }
}

fn find_chrome_binary() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("CHROME_BIN") {
        let path = PathBuf::from(p);
        if path.exists() {
            return Some(path);
        }
    }

    [
        "/snap/chromium/current/usr/lib/chromium-browser/chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/google-chrome",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
    ]
    .iter()
    .map(PathBuf::from)
    .find(|p| p.exists())
}

impl RenderEngine for BrowserRenderEngine {
    type Session = BrowserSession;

    async fn start_session(&self, label: &str) -> Result<BrowserSession, FetchError> {
        tracing::debug!("Starting browser session for {}", label);
        Ok(BrowserSession {
            browser: Arc::clone(&self.browser),
            timeout: self.timeout,
            page: None,
            closed: false,
        })
    }
}

pub struct BrowserSession {
    browser: Arc<Browser>,
    timeout: Duration,
    page: Option<Page>,
    closed: bool,
}

impl BrowserSession {
    async fn close_tab(&mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                tracing::debug!("Failed to close tab: {}", e);
            }
        }
    }
}

impl RenderSession for BrowserSession {
    async fn open(&mut self, url: &Url) -> Result<(), FetchError> {
        if self.closed {
            return Err(FetchError::SessionClosed);
        }
        self.close_tab().await;

        let target = url.to_string();
        let timeout = self.timeout;
        let network = |e: chromiumoxide::error::CdpError| FetchError::Network {
            url: target.clone(),
            message: e.to_string(),
        };
        let timed_out = || FetchError::Timeout {
            url: target.clone(),
            secs: timeout.as_secs(),
        };

        // The tab is stored before navigating so a timeout or a dropped
        // future still leaves it reachable for `close_tab` and `Drop`.
        let page = tokio::time::timeout(timeout, self.browser.new_page("about:blank"))
            .await
            .map_err(|_| timed_out())?
            .map_err(&network)?;
        self.page = Some(page.clone());

        let navigation = async {
            page.goto(target.as_str()).await?;
            page.wait_for_navigation().await?;
            Ok::<(), chromiumoxide::error::CdpError>(())
        };

        let result = match tokio::time::timeout(timeout, navigation).await {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => network(e),
            Err(_) => timed_out(),
        };
        self.close_tab().await;
        Err(result)
    }

    async fn snapshot(&mut self) -> Result<RenderedPage, FetchError> {
        if self.closed {
            return Err(FetchError::SessionClosed);
        }
        let page = self.page.as_ref().ok_or(FetchError::NoPage)?;

        let current = page
            .url()
            .await
            .ok()
            .flatten()
            .and_then(|u| Url::parse(&u).ok())
            .ok_or(FetchError::NoPage)?;

        let html = page.content().await.map_err(|e| FetchError::Network {
            url: current.to_string(),
            message: format!("Failed to read page content: {e}"),
        })?;

        Ok(RenderedPage::new(current, html))
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.close_tab().await;
        self.closed = true;
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        // Best effort for sessions abandoned without `close`.
        if let Some(page) = self.page.take() {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    let _ = page.close().await;
                });
            }
        }
    }
}

//! HTTP render engine
//!
//! Fetches the server-rendered HTML of a listing page with a plain GET
//! request. Listing sites that build their results client-side need the
//! `browser` engine instead.

use crate::config::UserAgentConfig;
use crate::render::{RenderEngine, RenderSession, RenderedPage};
use crate::FetchError;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Total request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10).min(timeout))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Render engine backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpRenderEngine {
    client: Client,
    timeout: Duration,
}

impl HttpRenderEngine {
    pub fn new(config: &UserAgentConfig, timeout: Duration) -> Result<Self, FetchError> {
        let client =
            build_http_client(config, timeout).map_err(|e| FetchError::Session(e.to_string()))?;
        Ok(Self { client, timeout })
    }

    pub fn with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

impl RenderEngine for HttpRenderEngine {
    type Session = HttpSession;

    async fn start_session(&self, label: &str) -> Result<HttpSession, FetchError> {
        tracing::debug!("Starting HTTP session for {}", label);
        Ok(HttpSession {
            client: self.client.clone(),
            timeout: self.timeout,
            current: None,
            closed: false,
        })
    }
}

/// A session holds the last fetched page until the next `open`
#[derive(Debug)]
pub struct HttpSession {
    client: Client,
    timeout: Duration,
    current: Option<RenderedPage>,
    closed: bool,
}

impl HttpSession {
    async fn fetch(&self, url: &Url) -> Result<RenderedPage, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !content_type.contains("text/html") {
            return Err(FetchError::ContentMismatch {
                url: url.to_string(),
                content_type,
            });
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(|e| self.classify(url, e))?;

        Ok(RenderedPage::new(final_url, body))
    }

    fn classify(&self, url: &Url, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                secs: self.timeout.as_secs(),
            }
        } else if error.is_connect() {
            FetchError::Network {
                url: url.to_string(),
                message: "Connection refused".to_string(),
            }
        } else {
            FetchError::Network {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

impl RenderSession for HttpSession {
    async fn open(&mut self, url: &Url) -> Result<(), FetchError> {
        if self.closed {
            return Err(FetchError::SessionClosed);
        }

        self.current = None;
        let page = self.fetch(url).await?;
        tracing::debug!("Fetched {} ({} bytes)", page.url(), page.html().len());
        self.current = Some(page);
        Ok(())
    }

    async fn snapshot(&mut self) -> Result<RenderedPage, FetchError> {
        if self.closed {
            return Err(FetchError::SessionClosed);
        }
        self.current.clone().ok_or(FetchError::NoPage)
    }

    async fn close(&mut self) {
        self.current = None;
        self.closed = true;
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

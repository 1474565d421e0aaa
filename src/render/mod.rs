//! Render engine boundary
//!
//! The crawl core never talks to a concrete browser. It asks a
//! [`RenderEngine`] for a [`RenderSession`], navigates that session to a URL,
//! and takes a [`RenderedPage`] snapshot of the DOM once the page has
//! settled. Adapters then query the snapshot through the helpers in [`dom`].
//!
//! Sessions follow scoped acquisition: whoever starts a session calls
//! [`RenderSession::close`] on every exit path. `close` is idempotent, and
//! sessions dropped without it (an aborted or panicking task) release what
//! they hold in `Drop`.

pub mod dom;
mod http;

#[cfg(feature = "browser")]
mod browser;

pub use http::{build_http_client, HttpRenderEngine, HttpSession};

#[cfg(feature = "browser")]
pub use browser::{BrowserRenderEngine, BrowserSession};

use crate::FetchError;
use scraper::Html;
use std::future::Future;
use url::Url;

/// A snapshot of a rendered page
#[derive(Debug, Clone)]
pub struct RenderedPage {
    url: Url,
    html: String,
}

impl RenderedPage {
    pub fn new(url: Url, html: impl Into<String>) -> Self {
        Self {
            url,
            html: html.into(),
        }
    }

    /// The URL the page was loaded from (after redirects)
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// Parses the snapshot into a queryable document
    ///
    /// The document is not `Send`; parse it inside synchronous code and do
    /// not hold it across an await point.
    pub fn document(&self) -> Html {
        Html::parse_document(&self.html)
    }
}

/// Starts render sessions
pub trait RenderEngine: Send + Sync + Clone + 'static {
    type Session: RenderSession + 'static;

    /// Acquires a new session; `label` names the owner in logs
    fn start_session(
        &self,
        label: &str,
    ) -> impl Future<Output = Result<Self::Session, FetchError>> + Send;
}

/// One logical browsing session, used by one task at a time
pub trait RenderSession: Send {
    /// Navigates to `url` and waits until the page has loaded or the
    /// engine's timeout elapses
    fn open(&mut self, url: &Url) -> impl Future<Output = Result<(), FetchError>> + Send;

    /// Captures the current DOM of the open page
    fn snapshot(&mut self) -> impl Future<Output = Result<RenderedPage, FetchError>> + Send;

    /// Releases the session. Calling it again is a no-op.
    fn close(&mut self) -> impl Future<Output = ()> + Send;

    fn is_closed(&self) -> bool;
}

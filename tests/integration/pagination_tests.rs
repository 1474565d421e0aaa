//! A custom adapter driven through the public crawl building blocks

use jobtide::adapters::SiteAdapter;
use jobtide::config::UserAgentConfig;
use jobtide::crawler::{PacingConfig, PaginationController};
use jobtide::render::{dom, HttpRenderEngine};
use jobtide::storage::{JobStore, SqliteJobStore};
use jobtide::{ExtractionError, FetchError, RawJob};
use scraper::ElementRef;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A minimal listing site: `li.job` items with a link and a `.company`
struct SiteA {
    base: Url,
}

impl SiteAdapter for SiteA {
    fn name(&self) -> &'static str {
        "SiteA"
    }

    fn base_url(&self) -> &Url {
        &self.base
    }

    fn page_url(&self, keyword: &str, page: u32) -> Result<Url, FetchError> {
        let mut url = self
            .base
            .join("/jobs")
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
            .ok_or(ExtractionError::MissingElement(".company"))?;

        Ok(RawJob {
            title: dom::text(link),
            company,
            url: dom::resolve_url(&self.base, &href)?.to_string(),
            ..RawJob::default()
        })
    }
}

fn user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    }
}

fn controller(server: &MockServer) -> PaginationController<HttpRenderEngine> {
    let engine = HttpRenderEngine::new(&user_agent(), Duration::from_secs(5)).unwrap();
    let adapter = Arc::new(SiteA {
        base: Url::parse(&server.uri()).unwrap(),
    });
    PaginationController::new(engine, adapter, PacingConfig::none(), CancellationToken::new())
}

async fn mount(server: &MockServer, page: u32, body: &str) {
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .and(query_param("q", "backend"))
        .and(query_param("page", page.to_string()))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

const PAGE_ONE: &str = r#"
<ul>
  <li class="job"><a href="/jobs/1">Backend Engineer</a><span class="company">Acme</span></li>
  <li class="job"><a href="/jobs/2">Platform   Engineer</a><span class="company">Beta</span></li>
  <li class="job"><a href="/jobs/3">No company</a></li>
</ul>
"#;

#[tokio::test]
async fn test_collect_then_save_is_idempotent() {
    let server = MockServer::start().await;
    mount(&server, 1, PAGE_ONE).await;

    let collection = controller(&server).collect("backend", 1).await.unwrap();
    assert_eq!(collection.jobs.len(), 2);
    assert_eq!(collection.pages_ok, 1);
    assert_eq!(collection.jobs[1].title, "Platform Engineer");
    assert!(collection.jobs.iter().all(|j| j.source == "SiteA"));
    assert!(collection.jobs.iter().all(|j| j.keyword == "backend"));
    assert_eq!(collection.jobs[0].url, format!("{}/jobs/1", server.uri()));

    let dir = TempDir::new().unwrap();
    let store = SqliteJobStore::new(&dir.path().join("jobs.db")).unwrap();

    assert_eq!(store.save(&collection.jobs).unwrap().saved, 2);
    assert_eq!(store.save(&collection.jobs).unwrap().saved, 0);
    assert_eq!(store.count().unwrap(), 2);
}

#[tokio::test]
async fn test_missing_pages_are_counted_not_fatal() {
    let server = MockServer::start().await;
    mount(&server, 1, PAGE_ONE).await;
    // Page 2 is not mounted, so the mock server answers 404.

    let collection = controller(&server).collect("backend", 2).await.unwrap();
    assert_eq!(collection.jobs.len(), 2);
    assert_eq!(collection.pages_ok, 1);
    assert_eq!(collection.pages_failed, 1);
}

#[tokio::test]
async fn test_non_html_page_is_a_failed_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"jobs": []}"#, "application/json"))
        .mount(&server)
        .await;

    let collection = controller(&server).collect("backend", 1).await.unwrap();
    assert!(collection.jobs.is_empty());
    assert_eq!(collection.pages_failed, 1);
}

//! End-to-end crawls through `run_crawl`

use crate::support::{
    config_for, fail_saramin, jobkorea_item, mount_jobkorea, mount_saramin, page, saramin_item,
};
use jobtide::crawler::run_crawl;
use jobtide::storage::{open_store, JobQuery, JobStore, RunStatus, SortField, SortOrder};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::MockServer;

#[tokio::test]
async fn test_crawl_saves_each_posting_once() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_saramin(
        &server,
        "python",
        1,
        page(&[
            saramin_item(1, "Python 개발자", Some("에이콘")),
            saramin_item(2, "Django 개발자", Some("베타랩스")),
            saramin_item(3, "회사 없음", None),
        ]),
    )
    .await;

    let config = config_for(&server.uri(), &["saramin"], &["python"], 1, &dir);
    let store = Arc::new(open_store(Path::new(&config.output.database_path)).unwrap());

    let first = run_crawl(&config, store.clone(), "hash", CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(first.scraped, 2);
    assert_eq!(first.saved, 2);
    assert_eq!(first.new_jobs.len(), 2);
    assert!(!first.cancelled);

    let second = run_crawl(&config, store.clone(), "hash", CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(second.scraped, 2);
    assert_eq!(second.saved, 0);
    assert_eq!(second.duplicates, 2);
    assert!(second.new_jobs.is_empty());

    assert_eq!(store.count().unwrap(), 2);

    let run = store.latest_run().unwrap().unwrap();
    assert_eq!(run.id, second.run_id);
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "hash");
}

#[tokio::test]
async fn test_failed_page_is_skipped() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_saramin(
        &server,
        "rust",
        1,
        page(&[
            saramin_item(10, "Rust A", Some("Acme")),
            saramin_item(11, "Rust B", Some("Acme")),
        ]),
    )
    .await;
    fail_saramin(&server, "rust", 2).await;
    mount_saramin(&server, "rust", 3, page(&[saramin_item(12, "Rust C", Some("Beta"))])).await;

    let config = config_for(&server.uri(), &["saramin"], &["rust"], 3, &dir);
    let store = Arc::new(open_store(Path::new(&config.output.database_path)).unwrap());

    let report = run_crawl(&config, store.clone(), "hash", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.pages_failed, 1);
    assert_eq!(report.scraped, 3);
    assert_eq!(report.saved, 3);

    let titles: Vec<String> = report.new_jobs.iter().map(|j| j.title.clone()).collect();
    assert_eq!(titles, vec!["Rust A", "Rust B", "Rust C"]);
}

#[tokio::test]
async fn test_results_follow_keyword_then_site_order() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_saramin(&server, "python", 1, page(&[saramin_item(1, "S-python", Some("A"))])).await;
    mount_jobkorea(&server, "python", 1, page(&[jobkorea_item(1, "J-python", "B")])).await;
    mount_saramin(&server, "rust", 1, page(&[saramin_item(2, "S-rust", Some("C"))])).await;
    mount_jobkorea(&server, "rust", 1, page(&[jobkorea_item(2, "J-rust", "D")])).await;

    let config = config_for(
        &server.uri(),
        &["saramin", "jobkorea"],
        &["python", "rust"],
        1,
        &dir,
    );
    let store = Arc::new(open_store(Path::new(&config.output.database_path)).unwrap());

    let report = run_crawl(&config, store.clone(), "hash", CancellationToken::new())
        .await
        .unwrap();

    let order: Vec<(String, String, String)> = report
        .new_jobs
        .iter()
        .map(|j| (j.title.clone(), j.source.clone(), j.keyword.clone()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("S-python".into(), "Saramin".into(), "python".into()),
            ("J-python".into(), "JobKorea".into(), "python".into()),
            ("S-rust".into(), "Saramin".into(), "rust".into()),
            ("J-rust".into(), "JobKorea".into(), "rust".into()),
        ]
    );

    let jobkorea = store.query(&JobQuery::new().source("JobKorea")).unwrap();
    assert_eq!(jobkorea.len(), 2);
    assert!(jobkorea.iter().all(|j| j.location.as_deref() == Some("부산")));

    let by_title = store
        .query(&JobQuery::new().sort_by(SortField::Title, SortOrder::Asc))
        .unwrap();
    assert_eq!(by_title.first().unwrap().title, "J-python");
}

#[tokio::test]
async fn test_same_posting_under_two_keywords_is_stored_once() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let shared = saramin_item(77, "Full-stack 개발자", Some("Acme"));
    mount_saramin(&server, "python", 1, page(&[shared.clone()])).await;
    mount_saramin(&server, "rust", 1, page(&[shared])).await;

    let config = config_for(&server.uri(), &["saramin"], &["python", "rust"], 1, &dir);
    let store = Arc::new(open_store(Path::new(&config.output.database_path)).unwrap());

    let report = run_crawl(&config, store.clone(), "hash", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.scraped, 2);
    assert_eq!(report.saved, 1);
    assert_eq!(report.duplicates, 1);

    let stored = store.query(&JobQuery::new()).unwrap();
    assert_eq!(stored.len(), 1);
    // The first keyword to see the posting wins.
    assert_eq!(stored[0].keyword, "python");

    let urls: HashSet<&str> = stored.iter().map(|j| j.url.as_str()).collect();
    assert_eq!(urls.len(), stored.len());
}

#[tokio::test]
async fn test_cancelled_crawl_is_marked_interrupted() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_saramin(&server, "python", 1, page(&[saramin_item(1, "Dev", Some("Acme"))])).await;

    let config = config_for(&server.uri(), &["saramin"], &["python"], 1, &dir);
    let store = Arc::new(open_store(Path::new(&config.output.database_path)).unwrap());

    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = run_crawl(&config, store.clone(), "hash", cancel).await.unwrap();
    assert!(report.cancelled);
    assert_eq!(report.saved, 0);

    let run = store.latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Interrupted);
    assert_eq!(store.count().unwrap(), 0);
}

//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use std::sync::Arc;
use std::time::Duration;
use sumi_index::config::{
    Config, CrawlerConfig, SearchConfig, SeedEntry, StorageConfig, UserAgentConfig,
};
use sumi_index::crawler::{BatchReport, Coordinator};
use sumi_index::state::{DocumentStatus, FrontierStatus};
use sumi_index::storage::{lock_storage, shared, SharedStorage, SqliteStorage, Storage};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration seeded with the given URLs
pub fn create_test_config(seeds: Vec<String>) -> Config {
    Config {
        crawler: CrawlerConfig {
            batch_size: 10,
            request_delay: 0,
            idle_sleep: 100,
            max_attempts: 3,
            fetch_retries: 0,
            retry_backoff: 1,
            ..CrawlerConfig::default()
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        storage: StorageConfig {
            database_path: ":memory:".to_string(),
        },
        search: SearchConfig::default(),
        seeds: seeds
            .into_iter()
            .map(|url| SeedEntry { url, priority: 0 })
            .collect(),
    }
}

pub fn html_page(title: &str, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(format!(
            "<html><head><title>{}</title></head><body>{}</body></html>",
            title, body
        ))
}

pub fn setup(config: Config) -> (Coordinator<SqliteStorage>, SharedStorage<SqliteStorage>) {
    let storage = shared(SqliteStorage::new_in_memory().expect("in-memory database"));
    let coordinator =
        Coordinator::new(Arc::new(config), storage.clone()).expect("coordinator should build");
    coordinator.seed_from_config().expect("seeding should succeed");
    (coordinator, storage)
}

/// Runs batches until the frontier has nothing left to claim
pub async fn crawl_until_empty(coordinator: &Coordinator<SqliteStorage>) -> BatchReport {
    let mut total = BatchReport::default();
    loop {
        let report = coordinator.run_batch().await.expect("batch should run");
        if report.is_empty() {
            return total;
        }
        total.claimed += report.claimed;
        total.completed += report.completed;
        total.retried += report.retried;
        total.failed += report.failed;
        total.links_enqueued += report.links_enqueued;
        total.documents_written += report.documents_written;
    }
}

#[tokio::test]
async fn test_full_crawl_single_host() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Home",
            r#"<h1>Welcome</h1>
               <a href="/about">About</a>
               <a href="/contact#form">Contact</a>
               <a href="/about">About again</a>
               <a href="http://other.com/y">Elsewhere</a>
               <a href="mailto:me@example.com">Mail</a>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html_page("About", r#"About us <a href="/">Home</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/contact"))
        .respond_with(html_page("Contact", "Write to us"))
        .mount(&mock_server)
        .await;

    let (coordinator, storage) = setup(create_test_config(vec![format!("{}/", base_url)]));
    let report = crawl_until_empty(&coordinator).await;

    assert_eq!(report.completed, 3);
    assert_eq!(report.failed, 0);
    assert_eq!(report.links_enqueued, 2);
    assert_eq!(report.documents_written, 3);

    let storage = lock_storage(&storage).unwrap();
    assert_eq!(
        storage
            .count_frontier_by_status(FrontierStatus::Completed)
            .unwrap(),
        3
    );
    assert!(storage
        .get_frontier_entry("http://other.com/y")
        .unwrap()
        .is_none());

    let home = storage
        .get_document_by_url(&format!("{}/", base_url))
        .unwrap()
        .expect("home page stored");
    assert_eq!(home.title, "Home");
    assert!(home.content.starts_with("Welcome"));
    assert_eq!(home.status, DocumentStatus::Pending);
    assert_eq!(home.domain, "127.0.0.1");

    let contact = storage
        .get_document_by_url(&format!("{}/contact", base_url))
        .unwrap()
        .expect("fragment stripped before enqueue");
    assert_eq!(contact.content, "Write to us");
}

#[tokio::test]
async fn test_not_found_is_released_not_completed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let url = format!("{}/missing", mock_server.uri());
    let (coordinator, storage) = setup(create_test_config(vec![url.clone()]));

    let report = coordinator.run_batch().await.unwrap();
    assert_eq!(report.claimed, 1);
    assert_eq!(report.completed, 0);
    assert_eq!(report.retried, 1);

    let storage = lock_storage(&storage).unwrap();
    let entry = storage.get_frontier_entry(&url).unwrap().unwrap();
    assert_eq!(entry.status, FrontierStatus::Pending);
    assert_eq!(entry.attempts, 1);
    assert!(entry.last_error.unwrap().contains("404"));
    assert!(storage.get_document_by_url(&url).unwrap().is_none());
}

#[tokio::test]
async fn test_repeated_failures_become_terminal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&mock_server)
        .await;

    let url = format!("{}/gone", mock_server.uri());
    let mut config = create_test_config(vec![url.clone()]);
    config.crawler.max_attempts = 2;
    let (coordinator, storage) = setup(config);

    let report = crawl_until_empty(&coordinator).await;
    assert_eq!(report.claimed, 2);
    assert_eq!(report.retried, 1);
    assert_eq!(report.failed, 1);

    let entry = lock_storage(&storage)
        .unwrap()
        .get_frontier_entry(&url)
        .unwrap()
        .unwrap();
    assert_eq!(entry.status, FrontierStatus::Failed);
    assert_eq!(entry.attempts, 2);
}

#[tokio::test]
async fn test_server_error_retried_within_claim() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(html_page("Recovered", "Back online"))
        .mount(&mock_server)
        .await;

    let url = format!("{}/flaky", mock_server.uri());
    let mut config = create_test_config(vec![url.clone()]);
    config.crawler.fetch_retries = 2;
    let (coordinator, storage) = setup(config);

    let report = coordinator.run_batch().await.unwrap();
    assert_eq!(report.completed, 1);

    let storage = lock_storage(&storage).unwrap();
    let entry = storage.get_frontier_entry(&url).unwrap().unwrap();
    assert_eq!(entry.status, FrontierStatus::Completed);
    assert_eq!(entry.attempts, 0);
}

#[tokio::test]
async fn test_unchanged_recrawl_keeps_document() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stable"))
        .respond_with(html_page("Stable", "Nothing changes here"))
        .mount(&mock_server)
        .await;

    let url = format!("{}/stable", mock_server.uri());
    let (coordinator, storage) = setup(create_test_config(vec![url.clone()]));

    coordinator.run_batch().await.unwrap();
    let first = {
        let mut guard = lock_storage(&storage).unwrap();
        let record = guard.get_document_by_url(&url).unwrap().unwrap();
        guard
            .replace_postings(record.id, &record.content_hash, &[])
            .unwrap();
        guard
            .update_url_status(&url, FrontierStatus::Pending)
            .unwrap();
        guard.get_document_by_url(&url).unwrap().unwrap()
    };

    let report = coordinator.run_batch().await.unwrap();
    assert_eq!(report.completed, 1);
    assert_eq!(report.documents_written, 0);

    let second = lock_storage(&storage)
        .unwrap()
        .get_document_by_url(&url)
        .unwrap()
        .unwrap();
    assert_eq!(second.updated_at, first.updated_at);
    assert_eq!(second.status, DocumentStatus::Indexed);
    assert_eq!(second.version, 1);
}

#[tokio::test]
async fn test_changed_recrawl_updates_document() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/news"))
        .respond_with(html_page("News", "Old headline"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/news"))
        .respond_with(html_page("News", "Fresh headline"))
        .mount(&mock_server)
        .await;

    let url = format!("{}/news", mock_server.uri());
    let (coordinator, storage) = setup(create_test_config(vec![url.clone()]));

    coordinator.run_batch().await.unwrap();
    let first = {
        let mut guard = lock_storage(&storage).unwrap();
        guard
            .update_url_status(&url, FrontierStatus::Pending)
            .unwrap();
        guard.get_document_by_url(&url).unwrap().unwrap()
    };

    let report = coordinator.run_batch().await.unwrap();
    assert_eq!(report.documents_written, 1);

    let second = lock_storage(&storage)
        .unwrap()
        .get_document_by_url(&url)
        .unwrap()
        .unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.content, "Fresh headline");
    assert_ne!(second.content_hash, first.content_hash);
    assert_eq!(second.status, DocumentStatus::Pending);
    assert_eq!(second.version, 2);
}

#[tokio::test]
async fn test_priority_order_across_batches() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html_page("Page", "content"))
        .mount(&mock_server)
        .await;

    let base_url = mock_server.uri();
    let mut config = create_test_config(vec![]);
    config.crawler.batch_size = 1;
    let (coordinator, storage) = setup(config);

    {
        let mut guard = lock_storage(&storage).unwrap();
        guard
            .add_to_crawl_queue(&format!("{}/low", base_url), 0)
            .unwrap();
        guard
            .add_to_crawl_queue(&format!("{}/high", base_url), 9)
            .unwrap();
    }

    coordinator.run_batch().await.unwrap();

    let guard = lock_storage(&storage).unwrap();
    let high = guard
        .get_frontier_entry(&format!("{}/high", base_url))
        .unwrap()
        .unwrap();
    let low = guard
        .get_frontier_entry(&format!("{}/low", base_url))
        .unwrap()
        .unwrap();
    assert_eq!(high.status, FrontierStatus::Completed);
    assert_eq!(low.status, FrontierStatus::Pending);
}

#[tokio::test]
async fn test_run_until_shutdown() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page("Home", r#"<a href="/next">Next</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(html_page("Next", "The end"))
        .mount(&mock_server)
        .await;

    let (coordinator, storage) =
        setup(create_test_config(vec![format!("{}/", mock_server.uri())]));

    let report = coordinator
        .run_until(tokio::time::sleep(Duration::from_millis(500)))
        .await
        .unwrap();

    assert_eq!(report.completed, 2);
    assert_eq!(
        lock_storage(&storage)
            .unwrap()
            .count_frontier_by_status(FrontierStatus::Pending)
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_redirected_page_stored_under_final_url() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/docs"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/docs/"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/"))
        .respond_with(html_page("Docs", r#"<a href="intro.html">Intro</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/intro.html"))
        .respond_with(html_page("Intro", "getting started"))
        .mount(&mock_server)
        .await;

    let seed = format!("{}/docs", base_url);
    let (coordinator, storage) = setup(create_test_config(vec![seed.clone()]));
    let report = crawl_until_empty(&coordinator).await;
    assert_eq!(report.completed, 2);

    let storage = lock_storage(&storage).unwrap();

    // The relative link resolves against the directory the redirect landed in
    let intro = format!("{}/docs/intro.html", base_url);
    assert!(storage.get_frontier_entry(&intro).unwrap().is_some());
    assert!(storage
        .get_frontier_entry(&format!("{}/intro.html", base_url))
        .unwrap()
        .is_none());

    let docs = storage
        .get_document_by_url(&format!("{}/docs/", base_url))
        .unwrap()
        .expect("document stored under the redirect target");
    assert_eq!(docs.title, "Docs");
    assert!(storage.get_document_by_url(&seed).unwrap().is_none());

    let entry = storage.get_frontier_entry(&seed).unwrap().unwrap();
    assert_eq!(entry.status, FrontierStatus::Completed);
}

#[tokio::test]
async fn test_cross_host_redirect_is_not_followed() {
    let origin = MockServer::start().await;
    let elsewhere = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/go"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/page", elsewhere.uri()).as_str()),
        )
        .mount(&origin)
        .await;

    Mock::given(method("GET"))
        .respond_with(html_page("Elsewhere", r#"<a href="/login">Log in</a>"#))
        .expect(0)
        .mount(&elsewhere)
        .await;

    let seed = format!("{}/go", origin.uri());
    let (coordinator, storage) = setup(create_test_config(vec![seed.clone()]));
    let report = coordinator.run_batch().await.unwrap();
    assert_eq!(report.claimed, 1);
    assert_eq!(report.completed, 0);
    assert_eq!(report.retried, 1);

    let storage = lock_storage(&storage).unwrap();
    assert!(storage.get_document_by_url(&seed).unwrap().is_none());
    assert!(storage
        .get_frontier_entry(&format!("{}/login", origin.uri()))
        .unwrap()
        .is_none());

    let entry = storage.get_frontier_entry(&seed).unwrap().unwrap();
    assert_eq!(entry.status, FrontierStatus::Pending);
    assert_eq!(entry.attempts, 1);
    assert!(entry.last_error.unwrap().contains("302"));
}

//! Integration tests for indexing and search over a crawled corpus

use crate::crawl_tests::{crawl_until_empty, create_test_config, html_page, setup};
use sumi_index::config::SearchConfig;
use sumi_index::index::Indexer;
use sumi_index::search::{SearchEngine, SearchRequest};
use sumi_index::state::DocumentStatus;
use sumi_index::storage::{lock_storage, Storage};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer};

#[tokio::test]
async fn test_crawl_index_search() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Rust Home",
            r#"rust rust rust rust rust
               <a href="/guide">Guide</a>
               <a href="/python">Python</a>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/guide"))
        .respond_with(html_page("Guide", "rust crawler guide rust"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/python"))
        .respond_with(html_page("Python", "python only here"))
        .mount(&mock_server)
        .await;

    let (coordinator, storage) = setup(create_test_config(vec![format!("{}/", base_url)]));
    crawl_until_empty(&coordinator).await;

    let report = Indexer::new(storage.clone()).run_to_completion(10).unwrap();
    assert_eq!(report.documents_indexed, 3);

    let engine = SearchEngine::new(storage.clone(), SearchConfig::default());

    let response = engine.search(&SearchRequest::new("Rust")).unwrap();
    let urls: Vec<&str> = response.results.iter().map(|r| r.url.as_str()).collect();
    // "Guide" and "Python" link text add no "rust" occurrences
    assert_eq!(
        urls,
        vec![format!("{}/", base_url), format!("{}/guide", base_url)]
    );
    assert_eq!(response.results[0].score, 5);
    assert_eq!(response.results[0].rank, 1);
    assert_eq!(response.results[1].score, 2);
    assert_eq!(response.results[1].rank, 2);
    assert_eq!(response.results[1].title, "Guide");

    let page_two = engine
        .search(&SearchRequest::new("rust").with_page(1, 1))
        .unwrap();
    assert_eq!(page_two.results.len(), 1);
    assert_eq!(page_two.results[0].url, format!("{}/guide", base_url));
    assert_eq!(page_two.results[0].rank, 2);

    // The home page mentions "Python" in its link text
    let multi = engine.search(&SearchRequest::new("crawler python")).unwrap();
    assert_eq!(multi.results.len(), 3);
    assert!(multi.results.iter().all(|r| r.score == 1));

    assert!(engine.search(&SearchRequest::new("")).unwrap().results.is_empty());
    assert!(engine
        .search(&SearchRequest::new("nonexistent"))
        .unwrap()
        .results
        .is_empty());

    let stats = engine.stats().unwrap();
    assert_eq!(stats.total_documents, 3);
    assert_eq!(stats.indexed_documents, 3);
    assert_eq!(stats.total_searches, 5);
    assert_eq!(stats.top_queries.len(), 5);
    assert!(stats.top_queries.iter().all(|q| q.count == 1));
}

#[tokio::test]
async fn test_snippet_truncated_to_configured_length() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html_page("Long", &"searchable ".repeat(100)))
        .mount(&mock_server)
        .await;

    let (coordinator, storage) =
        setup(create_test_config(vec![format!("{}/", mock_server.uri())]));
    crawl_until_empty(&coordinator).await;
    Indexer::new(storage.clone()).run_to_completion(10).unwrap();

    let engine = SearchEngine::new(
        storage,
        SearchConfig {
            snippet_length: 20,
            ..SearchConfig::default()
        },
    );
    let response = engine.search(&SearchRequest::new("searchable")).unwrap();
    assert_eq!(response.results[0].snippet.chars().count(), 20);
    assert_eq!(response.results[0].score, 100);
}

#[tokio::test]
async fn test_recrawl_with_new_content_reindexes() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(html_page("Page", "alpha content"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(html_page("Page", "omega content"))
        .mount(&mock_server)
        .await;

    let url = format!("{}/page", mock_server.uri());
    let (coordinator, storage) = setup(create_test_config(vec![url.clone()]));
    let indexer = Indexer::new(storage.clone());
    let engine = SearchEngine::new(storage.clone(), SearchConfig::default());

    crawl_until_empty(&coordinator).await;
    indexer.run_to_completion(10).unwrap();
    assert_eq!(engine.search(&SearchRequest::new("alpha")).unwrap().results.len(), 1);

    lock_storage(&storage)
        .unwrap()
        .update_url_status(&url, sumi_index::FrontierStatus::Pending)
        .unwrap();
    crawl_until_empty(&coordinator).await;

    let record = lock_storage(&storage)
        .unwrap()
        .get_document_by_url(&url)
        .unwrap()
        .unwrap();
    assert_eq!(record.status, DocumentStatus::Pending);

    indexer.run_to_completion(10).unwrap();
    assert!(engine.search(&SearchRequest::new("alpha")).unwrap().results.is_empty());
    assert_eq!(engine.search(&SearchRequest::new("omega")).unwrap().results.len(), 1);
}

//! Keyword search over the inverted index
//!
//! Queries are tokenized like documents, ranked by summed term frequency and
//! paginated. Every executed search is recorded in the search log.

use crate::config::SearchConfig;
use crate::index::tokenize;
use crate::storage::{lock_storage, SearchLogEntry, SearchStats, SharedStorage, Storage};
use crate::SumiError;
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// A search to execute
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub query: String,

    /// Page size; 0 selects the configured default
    pub limit: u32,

    pub offset: u32,

    /// Recorded in the search log only
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
}

impl SearchRequest {
    /// Creates a request for the first page with the default page size
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_page(mut self, limit: u32, offset: u32) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }
}

/// A ranked search hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub document_id: i64,
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub score: i64,
    /// 1-based position across all pages
    pub rank: u32,
}

/// The results of a search
#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub took: Duration,
}

/// Extracts the distinct index terms of a query, in query order
pub fn query_terms(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(query)
        .into_iter()
        .filter(|term| seen.insert(term.clone()))
        .collect()
}

/// Runs searches against a storage backend
pub struct SearchEngine<S: Storage> {
    storage: SharedStorage<S>,
    config: SearchConfig,
}

impl<S: Storage> SearchEngine<S> {
    pub fn new(storage: SharedStorage<S>, config: SearchConfig) -> Self {
        Self { storage, config }
    }

    /// Executes a search and records it in the search log
    ///
    /// A query without indexable terms returns no results. A failure to
    /// write the search log is logged and does not fail the search.
    ///
    /// # Errors
    ///
    /// Returns [`SumiError::Persistence`] if the index cannot be queried.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SumiError> {
        let started = Instant::now();
        let limit = self.effective_limit(request.limit);
        let terms = query_terms(&request.query);

        let mut storage = lock_storage(&self.storage)?;

        let scored = if terms.is_empty() {
            Vec::new()
        } else {
            storage.search(&terms, limit, request.offset, self.config.snippet_length)?
        };

        let results: Vec<SearchResult> = scored
            .into_iter()
            .enumerate()
            .map(|(i, hit)| SearchResult {
                document_id: hit.id,
                title: hit.title,
                url: hit.url,
                snippet: hit.snippet,
                score: hit.score,
                rank: request.offset + i as u32 + 1,
            })
            .collect();

        let took = started.elapsed();

        let entry = SearchLogEntry {
            query: request.query.clone(),
            results_count: results.len() as u32,
            client_ip: request.client_ip.clone(),
            user_agent: request.user_agent.clone(),
            response_time_ms: took.as_millis() as u64,
        };
        if let Err(e) = storage.log_search(&entry) {
            tracing::warn!("Failed to log search '{}': {}", request.query, e);
        }

        tracing::debug!(
            "Search '{}' returned {} results in {:?}",
            request.query,
            results.len(),
            took
        );

        Ok(SearchResponse {
            query: request.query.clone(),
            results,
            took,
        })
    }

    /// Gets corpus and search statistics
    pub fn stats(&self) -> Result<SearchStats, SumiError> {
        let stats = lock_storage(&self.storage)?.get_stats(self.config.top_queries)?;
        Ok(stats)
    }

    fn effective_limit(&self, requested: u32) -> u32 {
        let limit = if requested == 0 {
            self.config.default_limit
        } else {
            requested
        };
        limit.min(self.config.max_limit)
    }
}

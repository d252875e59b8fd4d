//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::state::FrontierStatus;
use crate::storage::{
    Document, DocumentRecord, FrontierRecord, Posting, SaveOutcome, ScoredDocument,
    SearchLogEntry, SearchStats,
};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("URL not in crawl queue: {0}")]
    UrlNotFound(String),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This is the only persistence surface the crawl loop, indexer and search
/// engine depend on.
pub trait Storage: Send {
    // ===== Documents =====

    /// Saves an extracted document, keyed by URL
    ///
    /// New URLs are inserted. Existing URLs are overwritten only when the
    /// content digest differs; an unchanged digest leaves the row, including
    /// its `updated_at` and status, untouched. Every write resets the
    /// document status to pending. This is a single atomic statement.
    fn save_document(&mut self, document: &Document) -> StorageResult<SaveOutcome>;

    /// Gets a stored document by URL
    fn get_document_by_url(&self, url: &str) -> StorageResult<Option<DocumentRecord>>;

    /// Gets up to `limit` documents awaiting indexing, oldest first
    fn get_pending_documents(&self, limit: u32) -> StorageResult<Vec<DocumentRecord>>;

    // ===== Inverted Index =====

    /// Replaces all postings of a document and marks it indexed
    ///
    /// Nothing is written if the stored digest no longer equals
    /// `content_hash` (the document changed after it was read). Returns
    /// whether the postings were written.
    fn replace_postings(
        &mut self,
        document_id: i64,
        content_hash: &str,
        postings: &[Posting],
    ) -> StorageResult<bool>;

    /// Gets the postings of a document, ordered by word
    fn get_postings(&self, document_id: i64) -> StorageResult<Vec<Posting>>;

    // ===== Crawl Frontier =====

    /// Adds a URL to the crawl queue
    ///
    /// Duplicate URLs are silently ignored and keep their original
    /// priority. Returns true if a new entry was created.
    fn add_to_crawl_queue(&mut self, url: &str, priority: i64) -> StorageResult<bool>;

    /// Lists up to `limit` pending URLs without claiming them
    ///
    /// Ordered by priority descending, then creation time ascending.
    fn get_pending_urls(&self, limit: u32) -> StorageResult<Vec<String>>;

    /// Atomically claims up to `limit` pending URLs
    ///
    /// Claimed entries move to `processing`. Only rows still pending at
    /// claim time are returned, in frontier order, so concurrent crawlers
    /// never receive the same URL.
    fn claim_pending_urls(&mut self, limit: u32) -> StorageResult<Vec<String>>;

    /// Sets the status of a URL unconditionally
    ///
    /// No transition validation is done; callers sequence transitions.
    fn update_url_status(&mut self, url: &str, status: FrontierStatus) -> StorageResult<()>;

    /// Records a failed attempt for a URL
    ///
    /// The entry returns to `pending` while its attempt count stays below
    /// `max_attempts` and becomes `failed` afterwards. Returns the new status.
    fn release_url(
        &mut self,
        url: &str,
        error: &str,
        max_attempts: u32,
    ) -> StorageResult<FrontierStatus>;

    /// Returns `processing` entries untouched for longer than `older_than` to `pending`
    fn recover_stalled(&mut self, older_than: Duration) -> StorageResult<usize>;

    /// Gets a crawl queue entry by URL
    fn get_frontier_entry(&self, url: &str) -> StorageResult<Option<FrontierRecord>>;

    /// Counts crawl queue entries in a status
    fn count_frontier_by_status(&self, status: FrontierStatus) -> StorageResult<u64>;

    // ===== Search =====

    /// Ranks documents by the summed frequency of the given terms
    ///
    /// One row per document, ordered by score descending then document id
    /// ascending, with `limit`/`offset` applied after ranking.
    fn search(
        &self,
        terms: &[String],
        limit: u32,
        offset: u32,
        snippet_length: u32,
    ) -> StorageResult<Vec<ScoredDocument>>;

    /// Records an executed search
    fn log_search(&mut self, entry: &SearchLogEntry) -> StorageResult<()>;

    /// Gets corpus counts and the `top_queries` most frequent queries
    fn get_stats(&self, top_queries: u32) -> StorageResult<SearchStats>;
}

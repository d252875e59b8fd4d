//! Storage module for persisting crawl and search data
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Document persistence with content-digest change detection
//! - Crawl frontier queue management (claim, release, recovery)
//! - Inverted index postings
//! - Search logging and reporting

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::state::{DocumentStatus, FrontierStatus};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Storage handle shared between the crawl loop, indexer and search engine
pub type SharedStorage<S> = Arc<Mutex<S>>;

/// Wraps a storage backend into a shareable handle
pub fn shared<S: Storage>(storage: S) -> SharedStorage<S> {
    Arc::new(Mutex::new(storage))
}

/// Locks a shared storage handle
///
/// A poisoned lock is reported as a storage error rather than a panic.
pub fn lock_storage<S: Storage>(storage: &Mutex<S>) -> StorageResult<MutexGuard<'_, S>> {
    storage.lock().map_err(|_| StorageError::LockPoisoned)
}

/// Opens (or creates) the SQLite database at `path`
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Computes the hex-encoded SHA-256 digest of extracted text
pub fn content_digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// A document produced by the extractor, ready to be saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub url: String,
    pub title: String,
    pub content: String,
    pub domain: String,
    pub word_count: u32,
}

impl Document {
    /// Digest of this document's content
    pub fn content_hash(&self) -> String {
        content_digest(&self.content)
    }
}

/// A document as persisted in the store
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub content: String,
    pub content_hash: String,
    pub domain: String,
    pub word_count: u32,
    pub status: DocumentStatus,
    /// Incremented on every content change
    pub version: i64,
    pub crawled_at: String,
    pub updated_at: String,
}

/// What a document save did to the stored row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// New URL, row inserted
    Inserted,
    /// Existing URL with a different digest, row overwritten
    Updated,
    /// Existing URL with the same digest, row untouched
    Unchanged,
}

impl SaveOutcome {
    /// Returns true if the row was written
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Represents a crawl queue entry
#[derive(Debug, Clone)]
pub struct FrontierRecord {
    pub id: i64,
    pub url: String,
    pub status: FrontierStatus,
    pub priority: i64,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// One (word, document) entry of the inverted index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub word: String,
    pub frequency: u32,
    /// Token offsets of the word within the document
    pub positions: Vec<u32>,
}

/// A ranked search hit before pagination ranks are assigned
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub score: i64,
}

/// A search to be recorded in the search log
#[derive(Debug, Clone)]
pub struct SearchLogEntry {
    pub query: String,
    pub results_count: u32,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub response_time_ms: u64,
}

/// A historical query and how often it was run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryCount {
    pub query: String,
    pub count: u64,
}

/// Aggregate corpus and search statistics
#[derive(Debug, Clone)]
pub struct SearchStats {
    pub total_documents: u64,
    pub indexed_documents: u64,
    pub total_searches: u64,
    pub top_queries: Vec<QueryCount>,
}

//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Sumi-Index database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Extracted page content, one row per URL
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL DEFAULT '',
    content TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    domain TEXT NOT NULL,
    word_count INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL,
    version INTEGER NOT NULL DEFAULT 1,
    crawled_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_documents_status ON documents(status);
CREATE INDEX IF NOT EXISTS idx_documents_domain ON documents(domain);

-- Crawl frontier queue
CREATE TABLE IF NOT EXISTS crawl_queue (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    status TEXT NOT NULL,
    priority INTEGER NOT NULL DEFAULT 0,
    attempts INTEGER NOT NULL DEFAULT 0,
    last_error TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_crawl_queue_order ON crawl_queue(status, priority DESC, created_at, id);

-- Inverted index
CREATE TABLE IF NOT EXISTS search_index (
    word TEXT NOT NULL,
    document_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
    frequency INTEGER NOT NULL CHECK (frequency >= 0),
    positions TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (word, document_id)
);

CREATE INDEX IF NOT EXISTS idx_search_index_document ON search_index(document_id);

-- Executed searches
CREATE TABLE IF NOT EXISTS search_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    query TEXT NOT NULL,
    results_count INTEGER NOT NULL,
    user_ip TEXT,
    user_agent TEXT,
    response_time_ms INTEGER NOT NULL,
    searched_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_search_logs_query ON search_logs(query);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

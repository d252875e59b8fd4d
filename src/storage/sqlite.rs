//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::state::{DocumentStatus, FrontierStatus};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{
    Document, DocumentRecord, FrontierRecord, Posting, QueryCount, SaveOutcome, ScoredDocument,
    SearchLogEntry, SearchStats,
};
use chrono::{SecondsFormat, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;
use std::time::Duration;

const DOCUMENT_COLUMNS: &str = "id, url, title, content, content_hash, domain, word_count, \
     status, version, crawled_at, updated_at";

const FRONTIER_COLUMNS: &str =
    "id, url, status, priority, attempts, last_error, created_at, updated_at";

/// Frontier order: priority descending, then FIFO within a priority tier
const FRONTIER_ORDER: &str = "ORDER BY priority DESC, created_at ASC, id ASC";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;
        // Other crawler processes may hold the write lock while claiming
        conn.busy_timeout(Duration::from_secs(5))?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

/// Current time as a lexically sortable RFC 3339 string
fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn document_from_row(row: &Row<'_>) -> rusqlite::Result<DocumentRecord> {
    Ok(DocumentRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        content_hash: row.get(4)?,
        domain: row.get(5)?,
        word_count: row.get(6)?,
        status: DocumentStatus::from_db_string(&row.get::<_, String>(7)?)
            .unwrap_or(DocumentStatus::Pending),
        version: row.get(8)?,
        crawled_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn frontier_from_row(row: &Row<'_>) -> rusqlite::Result<FrontierRecord> {
    Ok(FrontierRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        status: FrontierStatus::from_db_string(&row.get::<_, String>(2)?)
            .unwrap_or(FrontierStatus::Failed),
        priority: row.get(3)?,
        attempts: row.get(4)?,
        last_error: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn join_positions(positions: &[u32]) -> String {
    positions
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn split_positions(positions: &str) -> Vec<u32> {
    positions
        .split(',')
        .filter_map(|p| p.parse().ok())
        .collect()
}

impl Storage for SqliteStorage {
    // ===== Documents =====

    fn save_document(&mut self, document: &Document) -> StorageResult<SaveOutcome> {
        let now = now_timestamp();
        let hash = document.content_hash();

        // RETURNING yields no row when the conflict update is skipped
        let written: Option<i64> = self
            .conn
            .query_row(
                "INSERT INTO documents
                 (url, title, content, content_hash, domain, word_count, status, version, crawled_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?8)
                 ON CONFLICT(url) DO UPDATE SET
                    title = excluded.title,
                    content = excluded.content,
                    content_hash = excluded.content_hash,
                    domain = excluded.domain,
                    word_count = excluded.word_count,
                    status = excluded.status,
                    version = documents.version + 1,
                    updated_at = excluded.updated_at
                 WHERE documents.content_hash != excluded.content_hash
                 RETURNING version",
                params![
                    document.url,
                    document.title,
                    document.content,
                    hash,
                    document.domain,
                    document.word_count,
                    DocumentStatus::Pending.to_db_string(),
                    now,
                ],
                |row| row.get(0),
            )
            .optional()?;

        Ok(match written {
            None => SaveOutcome::Unchanged,
            Some(1) => SaveOutcome::Inserted,
            Some(_) => SaveOutcome::Updated,
        })
    }

    fn get_document_by_url(&self, url: &str) -> StorageResult<Option<DocumentRecord>> {
        let document = self
            .conn
            .query_row(
                &format!("SELECT {} FROM documents WHERE url = ?1", DOCUMENT_COLUMNS),
                params![url],
                document_from_row,
            )
            .optional()?;

        Ok(document)
    }

    fn get_pending_documents(&self, limit: u32) -> StorageResult<Vec<DocumentRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM documents WHERE status = ?1 ORDER BY id ASC LIMIT ?2",
            DOCUMENT_COLUMNS
        ))?;

        let documents = stmt
            .query_map(
                params![DocumentStatus::Pending.to_db_string(), limit],
                document_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(documents)
    }

    // ===== Inverted Index =====

    fn replace_postings(
        &mut self,
        document_id: i64,
        content_hash: &str,
        postings: &[Posting],
    ) -> StorageResult<bool> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current_hash: Option<String> = tx
            .query_row(
                "SELECT content_hash FROM documents WHERE id = ?1",
                params![document_id],
                |row| row.get(0),
            )
            .optional()?;

        if current_hash.as_deref() != Some(content_hash) {
            // Dropping the transaction rolls it back
            return Ok(false);
        }

        tx.execute(
            "DELETE FROM search_index WHERE document_id = ?1",
            params![document_id],
        )?;

        {
            let mut insert = tx.prepare(
                "INSERT INTO search_index (word, document_id, frequency, positions)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for posting in postings {
                insert.execute(params![
                    posting.word,
                    document_id,
                    posting.frequency,
                    join_positions(&posting.positions),
                ])?;
            }
        }

        tx.execute(
            "UPDATE documents SET status = ?1 WHERE id = ?2",
            params![DocumentStatus::Indexed.to_db_string(), document_id],
        )?;

        tx.commit()?;
        Ok(true)
    }

    fn get_postings(&self, document_id: i64) -> StorageResult<Vec<Posting>> {
        let mut stmt = self.conn.prepare(
            "SELECT word, frequency, positions FROM search_index
             WHERE document_id = ?1 ORDER BY word ASC",
        )?;

        let postings = stmt
            .query_map(params![document_id], |row| {
                Ok(Posting {
                    word: row.get(0)?,
                    frequency: row.get(1)?,
                    positions: split_positions(&row.get::<_, String>(2)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(postings)
    }

    // ===== Crawl Frontier =====

    fn add_to_crawl_queue(&mut self, url: &str, priority: i64) -> StorageResult<bool> {
        let now = now_timestamp();
        let inserted = self.conn.execute(
            "INSERT INTO crawl_queue (url, status, priority, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(url) DO NOTHING",
            params![url, FrontierStatus::Pending.to_db_string(), priority, now],
        )?;
        Ok(inserted == 1)
    }

    fn get_pending_urls(&self, limit: u32) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT url FROM crawl_queue WHERE status = ?1 {} LIMIT ?2",
            FRONTIER_ORDER
        ))?;

        let urls = stmt
            .query_map(
                params![FrontierStatus::Pending.to_db_string(), limit],
                |row| row.get(0),
            )?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(urls)
    }

    fn claim_pending_urls(&mut self, limit: u32) -> StorageResult<Vec<String>> {
        let now = now_timestamp();
        // IMMEDIATE takes the write lock before reading, so no other
        // connection can claim between the select and the update
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let candidates: Vec<String> = {
            let mut stmt = tx.prepare(&format!(
                "SELECT url FROM crawl_queue WHERE status = ?1 {} LIMIT ?2",
                FRONTIER_ORDER
            ))?;
            let rows = stmt
                .query_map(
                    params![FrontierStatus::Pending.to_db_string(), limit],
                    |row| row.get(0),
                )?
                .collect::<Result<Vec<String>, _>>()?;
            rows
        };

        let mut claimed = Vec::with_capacity(candidates.len());
        {
            let mut claim = tx.prepare(
                "UPDATE crawl_queue SET status = ?1, updated_at = ?2
                 WHERE url = ?3 AND status = ?4",
            )?;
            for url in candidates {
                let changed = claim.execute(params![
                    FrontierStatus::Processing.to_db_string(),
                    now,
                    url,
                    FrontierStatus::Pending.to_db_string(),
                ])?;
                if changed == 1 {
                    claimed.push(url);
                }
            }
        }

        tx.commit()?;
        Ok(claimed)
    }

    fn update_url_status(&mut self, url: &str, status: FrontierStatus) -> StorageResult<()> {
        let now = now_timestamp();
        self.conn.execute(
            "UPDATE crawl_queue SET status = ?1, updated_at = ?2 WHERE url = ?3",
            params![status.to_db_string(), now, url],
        )?;
        Ok(())
    }

    fn release_url(
        &mut self,
        url: &str,
        error: &str,
        max_attempts: u32,
    ) -> StorageResult<FrontierStatus> {
        let now = now_timestamp();
        // Right-hand sides see the row as it was before the update
        let status: Option<String> = self
            .conn
            .query_row(
                "UPDATE crawl_queue SET
                    attempts = attempts + 1,
                    last_error = ?2,
                    updated_at = ?3,
                    status = CASE WHEN attempts + 1 >= ?4 THEN ?5 ELSE ?6 END
                 WHERE url = ?1
                 RETURNING status",
                params![
                    url,
                    error,
                    now,
                    max_attempts,
                    FrontierStatus::Failed.to_db_string(),
                    FrontierStatus::Pending.to_db_string(),
                ],
                |row| row.get(0),
            )
            .optional()?;

        let status = status.ok_or_else(|| StorageError::UrlNotFound(url.to_string()))?;
        FrontierStatus::from_db_string(&status)
            .ok_or_else(|| StorageError::Database(format!("Unknown frontier status '{}'", status)))
    }

    fn recover_stalled(&mut self, older_than: Duration) -> StorageResult<usize> {
        let age = chrono::Duration::from_std(older_than)
            .map_err(|e| StorageError::InvalidTimestamp(e.to_string()))?;
        let cutoff = Utc::now()
            .checked_sub_signed(age)
            .ok_or_else(|| {
                StorageError::InvalidTimestamp(format!("stall cutoff out of range: {:?}", older_than))
            })?
            .to_rfc3339_opts(SecondsFormat::Micros, true);
        let now = now_timestamp();

        let recovered = self.conn.execute(
            "UPDATE crawl_queue SET status = ?1, updated_at = ?2
             WHERE status = ?3 AND updated_at < ?4",
            params![
                FrontierStatus::Pending.to_db_string(),
                now,
                FrontierStatus::Processing.to_db_string(),
                cutoff,
            ],
        )?;
        Ok(recovered)
    }

    fn get_frontier_entry(&self, url: &str) -> StorageResult<Option<FrontierRecord>> {
        let entry = self
            .conn
            .query_row(
                &format!("SELECT {} FROM crawl_queue WHERE url = ?1", FRONTIER_COLUMNS),
                params![url],
                frontier_from_row,
            )
            .optional()?;

        Ok(entry)
    }

    fn count_frontier_by_status(&self, status: FrontierStatus) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM crawl_queue WHERE status = ?1",
            params![status.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Search =====

    fn search(
        &self,
        terms: &[String],
        limit: u32,
        offset: u32,
        snippet_length: u32,
    ) -> StorageResult<Vec<ScoredDocument>> {
        if terms.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let placeholders = (1..=terms.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let next = terms.len();

        let query = format!(
            "SELECT d.id, d.title, d.url, substr(d.content, 1, ?{snippet}) AS snippet,
                    SUM(si.frequency) AS score
             FROM search_index si
             JOIN documents d ON si.document_id = d.id
             WHERE si.word IN ({placeholders})
             GROUP BY d.id
             ORDER BY score DESC, d.id ASC
             LIMIT ?{limit} OFFSET ?{offset}",
            snippet = next + 1,
            placeholders = placeholders,
            limit = next + 2,
            offset = next + 3,
        );

        let mut values: Vec<Value> = terms.iter().map(|t| Value::Text(t.clone())).collect();
        values.push(Value::Integer(i64::from(snippet_length)));
        values.push(Value::Integer(i64::from(limit)));
        values.push(Value::Integer(i64::from(offset)));

        let mut stmt = self.conn.prepare(&query)?;
        let results = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok(ScoredDocument {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    url: row.get(2)?,
                    snippet: row.get(3)?,
                    score: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(results)
    }

    fn log_search(&mut self, entry: &SearchLogEntry) -> StorageResult<()> {
        let now = now_timestamp();
        self.conn.execute(
            "INSERT INTO search_logs
             (query, results_count, user_ip, user_agent, response_time_ms, searched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.query,
                entry.results_count,
                entry.client_ip,
                entry.user_agent,
                i64::try_from(entry.response_time_ms).unwrap_or(i64::MAX),
                now,
            ],
        )?;
        Ok(())
    }

    fn get_stats(&self, top_queries: u32) -> StorageResult<SearchStats> {
        let total_documents: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;

        let indexed_documents: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE status = ?1",
            params![DocumentStatus::Indexed.to_db_string()],
            |row| row.get(0),
        )?;

        let total_searches: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM search_logs", [], |row| row.get(0))?;

        let mut stmt = self.conn.prepare(
            "SELECT query, COUNT(*) AS count FROM search_logs
             GROUP BY query
             ORDER BY count DESC, query ASC
             LIMIT ?1",
        )?;
        let top = stmt
            .query_map(params![top_queries], |row| {
                Ok(QueryCount {
                    query: row.get(0)?,
                    count: row.get::<_, i64>(1)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SearchStats {
            total_documents: total_documents as u64,
            indexed_documents: indexed_documents as u64,
            total_searches: total_searches as u64,
            top_queries: top,
        })
    }
}

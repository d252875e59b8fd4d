//! Inverted index construction
//!
//! This module tokenizes stored documents and writes their postings:
//! - [`tokenize`] turns text into index terms
//! - [`build_postings`] groups terms into per-document postings
//! - [`Indexer`] processes documents awaiting indexing

mod tokenizer;

pub use tokenizer::{build_postings, tokenize, MIN_TOKEN_CHARS};

use crate::storage::{lock_storage, SharedStorage, Storage};
use crate::SumiError;

/// Summary of an indexing pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    /// Documents whose postings were written
    pub documents_indexed: usize,
    /// Postings written across all documents
    pub postings_written: usize,
    /// Documents that changed while being indexed and were left pending
    pub skipped: usize,
}

/// Builds postings for pending documents
pub struct Indexer<S: Storage> {
    storage: SharedStorage<S>,
}

impl<S: Storage> Indexer<S> {
    pub fn new(storage: SharedStorage<S>) -> Self {
        Self { storage }
    }

    /// Indexes up to `limit` pending documents
    ///
    /// Tokenization happens without holding the storage lock. A document
    /// re-crawled in the meantime keeps its new content pending and is
    /// counted as skipped.
    pub fn index_pending(&self, limit: u32) -> Result<IndexReport, SumiError> {
        let documents = lock_storage(&self.storage)?.get_pending_documents(limit)?;
        let mut report = IndexReport::default();

        for document in documents {
            let postings = build_postings(&document.content);

            let written = lock_storage(&self.storage)?.replace_postings(
                document.id,
                &document.content_hash,
                &postings,
            )?;

            if written {
                tracing::debug!(
                    "Indexed document {} ({}): {} terms",
                    document.id,
                    document.url,
                    postings.len()
                );
                report.documents_indexed += 1;
                report.postings_written += postings.len();
            } else {
                tracing::debug!("Document {} changed during indexing, skipped", document.id);
                report.skipped += 1;
            }
        }

        Ok(report)
    }

    /// Indexes batches of `batch_size` until nothing is pending
    pub fn run_to_completion(&self, batch_size: u32) -> Result<IndexReport, SumiError> {
        let mut total = IndexReport::default();

        loop {
            let report = self.index_pending(batch_size)?;
            total.documents_indexed += report.documents_indexed;
            total.postings_written += report.postings_written;
            total.skipped += report.skipped;

            // Skipped documents stay pending; stop when a pass makes no progress
            if report.documents_indexed == 0 {
                break;
            }
        }

        tracing::info!(
            "Indexing complete: {} documents, {} postings",
            total.documents_indexed,
            total.postings_written
        );
        Ok(total)
    }
}

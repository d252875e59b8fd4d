//! State module for tracking crawl and indexing progress
//!
//! # Components
//!
//! - `FrontierStatus`: Tracks a crawl queue entry (pending, processing, completed, failed)
//! - `DocumentStatus`: Tracks whether a stored document has been indexed

mod document_status;
mod frontier_status;

// Re-export main types
pub use document_status::DocumentStatus;
pub use frontier_status::FrontierStatus;

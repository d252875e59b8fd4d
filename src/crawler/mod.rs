//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with error classification
//! - HTML content and link extraction
//! - The crawl loop over the shared frontier

mod coordinator;
mod extractor;
mod fetcher;

pub use coordinator::{BatchReport, Coordinator, DISCOVERED_LINK_PRIORITY};
pub use extractor::{extract_document, extract_links, parse_page, ParsedPage};
pub use fetcher::{
    build_http_client, format_user_agent, same_host_redirects, FetchedPage, Fetcher,
    MAX_REDIRECTS,
};

//! Output module for terminal reports
//!
//! This module handles:
//! - Rendering index, crawl queue and search statistics
//! - Rendering ranked search results

pub mod stats;

pub use stats::{
    format_results, format_statistics, load_frontier_counts, print_results, print_statistics,
    FrontierCounts,
};

//! Statistics and search result reporting
//!
//! This module loads frontier counts from the storage layer and renders
//! statistics and search results for the terminal.

use crate::search::SearchResponse;
use crate::state::FrontierStatus;
use crate::storage::{SearchStats, Storage};
use crate::SumiError;
use std::fmt::Write;

/// Number of crawl queue entries per status
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontierCounts {
    pub pending: u64,
    pub processing: u64,
    pub completed: u64,
    pub failed: u64,
}

impl FrontierCounts {
    pub fn total(&self) -> u64 {
        self.pending + self.processing + self.completed + self.failed
    }
}

/// Loads frontier counts from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(FrontierCounts)` - Successfully loaded counts
/// * `Err(SumiError)` - Failed to query the crawl queue
pub fn load_frontier_counts<S: Storage + ?Sized>(storage: &S) -> Result<FrontierCounts, SumiError> {
    let mut counts = FrontierCounts::default();

    for status in FrontierStatus::all_statuses() {
        let count = storage.count_frontier_by_status(status)?;
        match status {
            FrontierStatus::Pending => counts.pending = count,
            FrontierStatus::Processing => counts.processing = count,
            FrontierStatus::Completed => counts.completed = count,
            FrontierStatus::Failed => counts.failed = count,
        }
    }

    Ok(counts)
}

/// Renders statistics as a text report
pub fn format_statistics(stats: &SearchStats, frontier: &FrontierCounts) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Index Statistics ===\n");

    let _ = writeln!(out, "Documents:");
    let _ = writeln!(out, "  Total documents: {}", stats.total_documents);
    let _ = writeln!(out, "  Indexed documents: {}", stats.indexed_documents);
    let _ = writeln!(out);

    let _ = writeln!(out, "Crawl Queue:");
    let _ = writeln!(out, "  Pending: {}", frontier.pending);
    let _ = writeln!(out, "  Processing: {}", frontier.processing);
    let _ = writeln!(out, "  Completed: {}", frontier.completed);
    let _ = writeln!(out, "  Failed: {}", frontier.failed);
    let _ = writeln!(out);

    let _ = writeln!(out, "Searches:");
    let _ = writeln!(out, "  Total searches: {}", stats.total_searches);

    if !stats.top_queries.is_empty() {
        let _ = writeln!(out, "\nTop Queries:");
        for (i, entry) in stats.top_queries.iter().enumerate() {
            let _ = writeln!(out, "  {}. {} ({})", i + 1, entry.query, entry.count);
        }
    }

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &SearchStats, frontier: &FrontierCounts) {
    print!("{}", format_statistics(stats, frontier));
}

/// Renders a search response as a ranked list
pub fn format_results(response: &SearchResponse) -> String {
    let mut out = String::new();

    if response.results.is_empty() {
        let _ = writeln!(out, "No results for '{}'", response.query);
        return out;
    }

    for result in &response.results {
        let title = if result.title.is_empty() {
            result.url.as_str()
        } else {
            result.title.as_str()
        };
        let _ = writeln!(out, "{}. {} (score {})", result.rank, title, result.score);
        let _ = writeln!(out, "   {}", result.url);
        if !result.snippet.is_empty() {
            let _ = writeln!(out, "   {}", result.snippet);
        }
    }

    let _ = writeln!(
        out,
        "\n{} results in {} ms",
        response.results.len(),
        response.took.as_millis()
    );

    out
}

/// Prints a search response to stdout
pub fn print_results(response: &SearchResponse) {
    print!("{}", format_results(response));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchResult;
    use crate::storage::{QueryCount, SqliteStorage};
    use std::time::Duration;

    #[test]
    fn test_load_frontier_counts() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.add_to_crawl_queue("http://example.com/a", 0).unwrap();
        storage.add_to_crawl_queue("http://example.com/b", 0).unwrap();
        storage.add_to_crawl_queue("http://example.com/c", 0).unwrap();
        storage
            .update_url_status("http://example.com/a", FrontierStatus::Completed)
            .unwrap();

        let counts = load_frontier_counts(&storage).unwrap();
        assert_eq!(counts.pending, 2);
        assert_eq!(counts.completed, 1);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_format_statistics() {
        let stats = SearchStats {
            total_documents: 4,
            indexed_documents: 3,
            total_searches: 7,
            top_queries: vec![QueryCount {
                query: "rust".to_string(),
                count: 5,
            }],
        };
        let text = format_statistics(&stats, &FrontierCounts::default());

        assert!(text.contains("Total documents: 4"));
        assert!(text.contains("Indexed documents: 3"));
        assert!(text.contains("Total searches: 7"));
        assert!(text.contains("1. rust (5)"));
    }

    #[test]
    fn test_format_results() {
        let response = SearchResponse {
            query: "rust".to_string(),
            results: vec![SearchResult {
                document_id: 1,
                title: String::new(),
                url: "http://example.com/a".to_string(),
                snippet: "about rust".to_string(),
                score: 5,
                rank: 3,
            }],
            took: Duration::from_millis(2),
        };
        let text = format_results(&response);

        assert!(text.starts_with("3. http://example.com/a (score 5)"));
        assert!(text.contains("   about rust"));
    }

    #[test]
    fn test_format_no_results() {
        let response = SearchResponse {
            query: "nothing".to_string(),
            results: Vec::new(),
            took: Duration::ZERO,
        };
        assert_eq!(format_results(&response), "No results for 'nothing'\n");
    }
}

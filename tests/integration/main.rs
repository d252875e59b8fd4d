//! Integration test suite

mod crawl_tests;
mod search_tests;

//! URL handling module for Sumi-Index
//!
//! This module provides link resolution under the same-host policy, seed URL
//! validation and domain extraction.

mod normalize;

use url::Url;

// Re-export main functions
pub use normalize::{normalize_seed_url, resolve_link, same_host};

/// Extracts the domain (host) from a URL
///
/// Returns None if the URL has no host.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_index::url::extract_domain;
///
/// let url = Url::parse("https://Blog.Example.com/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("blog.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

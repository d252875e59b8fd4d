//! Sumi-Index: a small crawler and keyword search engine
//!
//! This crate crawls web pages into a SQLite corpus, deduplicating stored
//! documents by content digest, builds a term-frequency inverted index over
//! the extracted text and serves ranked, paginated keyword search.

pub mod config;
pub mod crawler;
pub mod index;
pub mod output;
pub mod search;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Index operations
#[derive(Debug, Error)]
pub enum SumiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error for {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("HTTP {status} fetching {url}")]
    Fetch { url: String, status: u16 },

    #[error("Parse error for {url}: {message}")]
    Parse { url: String, message: String },

    #[error("Persistence error: {0}")]
    Persistence(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl SumiError {
    /// Returns true if retrying the same request may succeed
    ///
    /// Transport failures, server errors and HTTP 429 are retryable.
    /// Every other status, parse and persistence failure is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            // Redirect loops and over-long chains fail the same way every time
            Self::Transport { source, .. } => !source.is_redirect(),
            Self::Fetch { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<rusqlite::Error> for SumiError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Persistence(storage::StorageError::Sqlite(err))
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Sumi-Index operations
pub type Result<T> = std::result::Result<T, SumiError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use state::{DocumentStatus, FrontierStatus};
pub use crate::url::{extract_domain, normalize_seed_url, resolve_link};

use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Sumi-Index
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default, rename = "seed")]
    pub seeds: Vec<SeedEntry>,
}

/// Crawl loop behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum number of URLs claimed from the frontier per batch
    pub batch_size: u32,

    /// Fixed delay after each processed URL (milliseconds)
    pub request_delay: u64,

    /// Sleep before re-polling an empty frontier (milliseconds)
    pub idle_sleep: u64,

    /// Failed attempts before a frontier entry is marked failed
    pub max_attempts: u32,

    /// Extra fetch attempts for retryable failures within one claim
    pub fetch_retries: u32,

    /// Base backoff between fetch retries, doubled each retry (milliseconds)
    pub retry_backoff: u64,

    /// Total request timeout (seconds)
    pub request_timeout: u64,

    /// Connection timeout (seconds)
    pub connect_timeout: u64,

    /// Age after which a `processing` entry is considered abandoned (seconds)
    pub stall_timeout: u64,
}

impl CrawlerConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay)
    }

    pub fn idle_sleep(&self) -> Duration {
        Duration::from_millis(self.idle_sleep)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    pub fn stall_timeout(&self) -> Duration {
        Duration::from_secs(self.stall_timeout)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            request_delay: 2000,
            idle_sleep: 5000,
            max_attempts: 3,
            fetch_retries: 2,
            retry_backoff: 500,
            request_timeout: 30,
            connect_timeout: 10,
            stall_timeout: 600,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Search engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SearchConfig {
    /// Maximum characters of content returned as a snippet
    pub snippet_length: u32,

    /// Page size used when a request does not specify one
    pub default_limit: u32,

    /// Upper bound on the page size of a single request
    pub max_limit: u32,

    /// Number of historical queries reported by stats
    pub top_queries: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            snippet_length: 200,
            default_limit: 10,
            max_limit: 100,
            top_queries: 10,
        }
    }
}

/// Seed URL entered into the frontier at startup
#[derive(Debug, Clone, Deserialize)]
pub struct SeedEntry {
    pub url: String,

    /// Frontier priority (higher is crawled sooner)
    #[serde(default)]
    pub priority: i64,
}

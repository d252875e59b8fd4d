//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests to fetch page content
//! - Same-host redirect policy
//! - Error classification (transport vs. HTTP status)

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::url::same_host;
use crate::SumiError;
use reqwest::{redirect::Policy, Client};
use url::Url;

/// Maximum redirect hops followed for one request
pub const MAX_REDIRECTS: usize = 10;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects; links on the page resolve against it
    pub final_url: Url,
    pub body: String,
}

/// Formats the user agent header value
///
/// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
pub fn format_user_agent(config: &UserAgentConfig) -> String {
    format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    )
}

/// Redirect policy that only follows hops to the host of the original request
///
/// A redirect to another host is not followed, so the 3xx response itself
/// becomes the final response.
pub fn same_host_redirects() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() > MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        let foreign = attempt
            .previous()
            .first()
            .map_or(false, |origin| !same_host(origin, attempt.url()));
        if foreign {
            attempt.stop()
        } else {
            attempt.follow()
        }
    })
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `crawler` - Timeouts are taken from the crawler configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use sumi_index::config::{CrawlerConfig, UserAgentConfig};
/// use sumi_index::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "SumiIndex".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, &CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(format_user_agent(user_agent))
        .timeout(crawler.request_timeout())
        .connect_timeout(crawler.connect_timeout())
        .redirect(same_host_redirects())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches page bodies over HTTP
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Creates a fetcher with a client built from the configuration
    pub fn new(user_agent: &UserAgentConfig, crawler: &CrawlerConfig) -> Result<Self, SumiError> {
        Ok(Self {
            client: build_http_client(user_agent, crawler)?,
        })
    }

    /// Fetches a URL and returns its body with the post-redirect URL
    ///
    /// Same-host redirects are followed. A non-2xx final status, including
    /// an unfollowed cross-host redirect, is a [`SumiError::Fetch`]; failures
    /// to connect, time out or read the body are a [`SumiError::Transport`].
    /// This makes a single attempt.
    pub async fn fetch(&self, url: &Url) -> Result<FetchedPage, SumiError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| SumiError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SumiError::Fetch {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(|source| SumiError::Transport {
            url: url.to_string(),
            source,
        })?;

        Ok(FetchedPage { final_url, body })
    }
}

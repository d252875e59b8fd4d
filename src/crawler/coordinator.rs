//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that coordinates:
//! - Seeding the frontier and recovering abandoned claims
//! - Claiming batches of URLs from the frontier
//! - Fetching (with bounded retry), extracting and saving documents
//! - Enqueuing discovered links
//! - Idle back-off and graceful shutdown

use crate::config::Config;
use crate::crawler::extractor::parse_page;
use crate::crawler::fetcher::{FetchedPage, Fetcher};
use crate::state::FrontierStatus;
use crate::storage::{lock_storage, SaveOutcome, SharedStorage, Storage};
use crate::SumiError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Priority given to links discovered during the crawl
pub const DISCOVERED_LINK_PRIORITY: i64 = 0;

/// Upper bound on a single retry backoff
const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(30);

/// Summary of one claimed batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// URLs claimed from the frontier
    pub claimed: usize,
    /// URLs processed successfully
    pub completed: usize,
    /// URLs released back to pending after a failure
    pub retried: usize,
    /// URLs that exhausted their attempts
    pub failed: usize,
    /// New frontier entries created from discovered links
    pub links_enqueued: usize,
    /// Documents inserted or changed
    pub documents_written: usize,
}

impl BatchReport {
    /// Returns true if the frontier had nothing to claim
    pub fn is_empty(&self) -> bool {
        self.claimed == 0
    }

    fn absorb(&mut self, other: &BatchReport) {
        self.claimed += other.claimed;
        self.completed += other.completed;
        self.retried += other.retried;
        self.failed += other.failed;
        self.links_enqueued += other.links_enqueued;
        self.documents_written += other.documents_written;
    }
}

/// What processing a single URL produced
struct PageOutcome {
    saved: SaveOutcome,
    links_enqueued: usize,
}

/// Main crawler coordinator structure
pub struct Coordinator<S: Storage> {
    config: Arc<Config>,
    storage: SharedStorage<S>,
    fetcher: Fetcher,
}

impl<S: Storage> Coordinator<S> {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `storage` - The shared storage handle
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(SumiError)` - Failed to build the HTTP client
    pub fn new(config: Arc<Config>, storage: SharedStorage<S>) -> Result<Self, SumiError> {
        let fetcher = Fetcher::new(&config.user_agent, &config.crawler)?;
        Ok(Self {
            config,
            storage,
            fetcher,
        })
    }

    /// Enqueues seed URLs with the given priority
    ///
    /// Seeds already in the frontier keep their state. Returns the number of
    /// new entries.
    pub fn seed<'a, I>(&self, urls: I, priority: i64) -> Result<usize, SumiError>
    where
        I: IntoIterator<Item = &'a Url>,
    {
        let mut storage = lock_storage(&self.storage)?;
        let mut added = 0;
        for url in urls {
            if storage.add_to_crawl_queue(url.as_str(), priority)? {
                tracing::debug!("Seeded {} (priority {})", url, priority);
                added += 1;
            }
        }
        Ok(added)
    }

    /// Enqueues the `[[seed]]` entries of the configuration
    pub fn seed_from_config(&self) -> Result<usize, SumiError> {
        let mut storage = lock_storage(&self.storage)?;
        let mut added = 0;
        for seed in &self.config.seeds {
            let url = crate::url::normalize_seed_url(&seed.url)?;
            if storage.add_to_crawl_queue(url.as_str(), seed.priority)? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Returns claims abandoned by a previous process to the frontier
    pub fn recover_stalled(&self) -> Result<usize, SumiError> {
        let older_than = self.config.crawler.stall_timeout();
        let recovered = lock_storage(&self.storage)?.recover_stalled(older_than)?;
        if recovered > 0 {
            tracing::info!("Recovered {} stalled URLs", recovered);
        }
        Ok(recovered)
    }

    /// Claims and processes one batch of URLs
    ///
    /// A failure on one URL is logged and released through
    /// [`Storage::release_url`]; it never aborts the batch. A URL whose
    /// release fails is logged and left in `processing` for
    /// [`Coordinator::recover_stalled`]. Only a failure to claim is returned
    /// as an error.
    pub async fn run_batch(&self) -> Result<BatchReport, SumiError> {
        let claimed = {
            let mut storage = lock_storage(&self.storage)?;
            storage.claim_pending_urls(self.config.crawler.batch_size)?
        };

        let mut report = BatchReport {
            claimed: claimed.len(),
            ..BatchReport::default()
        };

        for url in claimed {
            tracing::debug!("Processing URL: {}", url);

            match self.process_url(&url).await {
                Ok(outcome) => {
                    report.completed += 1;
                    report.links_enqueued += outcome.links_enqueued;
                    if outcome.saved.is_write() {
                        report.documents_written += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!("Error processing {}: {}", url, e);
                    match self.release(&url, &e) {
                        Ok(status) if status.is_terminal() => {
                            tracing::warn!("Giving up on {}", url);
                            report.failed += 1;
                        }
                        Ok(_) => report.retried += 1,
                        Err(release_err) => {
                            tracing::error!("Failed to release {}: {}", url, release_err);
                        }
                    }
                }
            }

            tokio::time::sleep(self.config.crawler.request_delay()).await;
        }

        if !report.is_empty() {
            tracing::info!(
                "Batch done: {} claimed, {} completed, {} retried, {} failed, {} new links",
                report.claimed,
                report.completed,
                report.retried,
                report.failed,
                report.links_enqueued
            );
        }

        Ok(report)
    }

    /// Runs the crawl loop until `shutdown` resolves
    ///
    /// Shutdown is only observed between batches and while idling, so a batch
    /// in progress always finishes. Claim failures are logged and treated
    /// like an empty frontier.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<BatchReport, SumiError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut totals = BatchReport::default();

        tracing::info!("Starting crawl loop");

        loop {
            let idle = match self.run_batch().await {
                Ok(report) => {
                    totals.absorb(&report);
                    report.is_empty()
                }
                Err(e) => {
                    tracing::error!("Crawl batch failed: {}", e);
                    true
                }
            };

            if idle {
                tracing::debug!(
                    "Frontier empty, sleeping {:?}",
                    self.config.crawler.idle_sleep()
                );
                tokio::select! {
                    _ = &mut shutdown => break,
                    _ = tokio::time::sleep(self.config.crawler.idle_sleep()) => {}
                }
            } else {
                // Poll shutdown once without waiting
                tokio::select! {
                    biased;
                    _ = &mut shutdown => break,
                    _ = std::future::ready(()) => {}
                }
            }
        }

        tracing::info!(
            "Crawl loop stopped: {} completed, {} failed",
            totals.completed,
            totals.failed
        );
        Ok(totals)
    }

    /// Runs the crawl loop until Ctrl-C
    pub async fn run(&self) -> Result<BatchReport, SumiError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Interrupt received, stopping after current batch");
        })
        .await
    }

    /// Records a failed attempt for a claimed URL
    fn release(&self, url: &str, error: &SumiError) -> Result<FrontierStatus, SumiError> {
        let status = lock_storage(&self.storage)?.release_url(
            url,
            &error.to_string(),
            self.config.crawler.max_attempts,
        )?;
        Ok(status)
    }

    /// Fetches, extracts and stores one claimed URL
    ///
    /// The document is stored under the post-redirect URL and its links are
    /// resolved against it. The claimed URL is the one marked completed.
    async fn process_url(&self, url: &str) -> Result<PageOutcome, SumiError> {
        let parsed_url = Url::parse(url)?;
        let fetched = self.fetch_with_retry(&parsed_url).await?;
        if fetched.final_url != parsed_url {
            tracing::debug!("{} redirected to {}", url, fetched.final_url);
        }
        let page = parse_page(&fetched.final_url, &fetched.body)?;

        let mut storage = lock_storage(&self.storage)?;
        let saved = storage.save_document(&page.document)?;
        tracing::debug!("Saved {}: {:?}", url, saved);

        let mut links_enqueued = 0;
        for link in &page.links {
            if storage.add_to_crawl_queue(link.as_str(), DISCOVERED_LINK_PRIORITY)? {
                links_enqueued += 1;
            }
        }

        storage.update_url_status(url, FrontierStatus::Completed)?;

        Ok(PageOutcome {
            saved,
            links_enqueued,
        })
    }

    /// Fetches with exponential backoff on retryable failures
    async fn fetch_with_retry(&self, url: &Url) -> Result<FetchedPage, SumiError> {
        let retries = self.config.crawler.fetch_retries;
        let mut backoff = self.config.crawler.retry_backoff();
        let mut attempt = 0;

        loop {
            match self.fetcher.fetch(url).await {
                Ok(page) => return Ok(page),
                Err(e) if e.is_retryable() && attempt < retries => {
                    attempt += 1;
                    tracing::debug!(
                        "Retrying {} in {:?} (attempt {}/{}): {}",
                        url,
                        backoff,
                        attempt,
                        retries,
                        e
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_RETRY_BACKOFF);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

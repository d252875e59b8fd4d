//! Sumi-Index main entry point
//!
//! This is the command-line interface for the Sumi-Index crawler and search
//! engine.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sumi_index::config::{load_config_with_hash, Config};
use sumi_index::crawler::Coordinator;
use sumi_index::index::Indexer;
use sumi_index::output::{load_frontier_counts, print_results, print_statistics};
use sumi_index::search::{SearchEngine, SearchRequest};
use sumi_index::storage::{lock_storage, open_storage, shared, SharedStorage, SqliteStorage};
use sumi_index::url::normalize_seed_url;
use tracing_subscriber::EnvFilter;

/// Sumi-Index: a small crawler and keyword search engine
///
/// Sumi-Index crawls pages into a SQLite corpus, builds a term-frequency
/// inverted index over the extracted text and answers ranked keyword
/// queries.
#[derive(Parser, Debug)]
#[command(name = "sumi-index")]
#[command(version = "1.0.0")]
#[command(about = "A small crawler and keyword search engine", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Add a URL to the crawl queue before crawling (repeatable)
    #[arg(long, value_name = "URL")]
    seed: Vec<String>,

    /// Priority given to --seed URLs
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    priority: i64,

    /// Process a single batch and exit instead of crawling until Ctrl-C
    #[arg(long, conflicts_with_all = ["index", "search", "stats"])]
    once: bool,

    /// Index all pending documents and exit
    #[arg(long, conflicts_with_all = ["search", "stats"])]
    index: bool,

    /// Run a search query and exit
    #[arg(long, value_name = "QUERY", conflicts_with = "stats")]
    search: Option<String>,

    /// Results per page for --search (0 = configured default)
    #[arg(long, default_value_t = 0)]
    limit: u32,

    /// Results to skip for --search
    #[arg(long, default_value_t = 0)]
    offset: u32,

    /// Show statistics from the database and exit
    #[arg(long)]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Arc::new(cfg)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // An unusable database is fatal for every mode
    let storage = match open_storage(Path::new(&config.storage.database_path)) {
        Ok(storage) => shared(storage),
        Err(e) => {
            tracing::error!(
                "Failed to open database {}: {}",
                config.storage.database_path,
                e
            );
            return Err(e.into());
        }
    };

    if cli.stats {
        handle_stats(&config, storage)?;
    } else if let Some(query) = &cli.search {
        handle_search(&config, storage, query, cli.limit, cli.offset)?;
    } else if cli.index {
        handle_index(&config, storage)?;
    } else {
        handle_crawl(config, storage, &cli.seed, cli.priority, cli.once).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_index=info,warn"),
            1 => EnvFilter::new("sumi_index=debug,info"),
            2 => EnvFilter::new("sumi_index=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(
    config: &Config,
    storage: SharedStorage<SqliteStorage>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}\n", config.storage.database_path);

    let frontier = load_frontier_counts(&*lock_storage(&storage)?)?;
    let stats = SearchEngine::new(storage, config.search.clone()).stats()?;

    print_statistics(&stats, &frontier);

    Ok(())
}

/// Handles the --search mode: runs one query and prints the ranked results
fn handle_search(
    config: &Config,
    storage: SharedStorage<SqliteStorage>,
    query: &str,
    limit: u32,
    offset: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = SearchEngine::new(storage, config.search.clone());
    let request = SearchRequest {
        user_agent: Some("sumi-index-cli".to_string()),
        ..SearchRequest::new(query).with_page(limit, offset)
    };

    let response = engine.search(&request)?;
    print_results(&response);

    Ok(())
}

/// Handles the --index mode: indexes every pending document
fn handle_index(
    config: &Config,
    storage: SharedStorage<SqliteStorage>,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = Indexer::new(storage).run_to_completion(config.crawler.batch_size)?;

    println!(
        "Indexed {} documents ({} postings, {} skipped)",
        report.documents_indexed, report.postings_written, report.skipped
    );

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Arc<Config>,
    storage: SharedStorage<SqliteStorage>,
    extra_seeds: &[String],
    priority: i64,
    once: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let coordinator = Coordinator::new(config.clone(), storage)?;

    coordinator.recover_stalled()?;

    let mut seeded = coordinator.seed_from_config()?;
    let seeds = extra_seeds
        .iter()
        .map(|s| normalize_seed_url(s))
        .collect::<Result<Vec<_>, _>>()?;
    seeded += coordinator.seed(&seeds, priority)?;
    tracing::info!(
        "Seeds: {} configured, {} from command line, {} new",
        config.seeds.len(),
        seeds.len(),
        seeded
    );

    let result = if once {
        coordinator.run_batch().await
    } else {
        coordinator.run().await
    };

    match result {
        Ok(report) => {
            tracing::info!(
                "Crawl finished: {} completed, {} retried, {} failed, {} documents written",
                report.completed,
                report.retried,
                report.failed,
                report.documents_written
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

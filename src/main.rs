//! Trawler main entry point
//!
//! Each crawl role runs as its own process: `fetch`, `refresh-hosts`, and
//! `scrape` are long-running loops sharing one store, `report` and `seed`
//! are one-shot operations.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;
use trawler::config::load_config_with_hash;
use trawler::filter::LinkFilter;
use trawler::frontier::UrlFrontier;
use trawler::hosts::HostRegistry;
use trawler::output::{load_report, print_report};
use trawler::runner::{FaultReporter, HostRefresher, PageFetcher, ScrapeRunner, StopSignal};
use trawler::scrape::{MicrodataScraper, Scraper, UrlScraper};
use trawler::storage::SqliteStorage;
use trawler::Config;
use url::Url;

/// Trawler: a distributed crawl frontier and politeness scheduler
#[derive(Parser, Debug)]
#[command(name = "trawler")]
#[command(version = "1.0.0")]
#[command(about = "A distributed crawl frontier and politeness scheduler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Cold-start mode: batch sizes of 1, no cache preload, no batch growth
    #[arg(long)]
    init: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch pages for the URLs the frontier hands out
    Fetch,

    /// Keep host robots.txt and statuses current
    RefreshHosts,

    /// Extract links and microdata from fetched pages
    Scrape,

    /// Print crawl progress counts and exit
    Report,

    /// Add starting URLs to the frontier and exit
    Seed {
        #[arg(value_name = "URL", required = true)]
        urls: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.init {
        tracing::info!("Init mode: conservative batch sizes, no cache preload");
        config.apply_init_mode();
    }

    match cli.command {
        Command::Fetch => run_fetcher(config).await?,
        Command::RefreshHosts => run_refresher(config).await?,
        Command::Scrape => run_scraper(config).await?,
        Command::Report => run_report(&config)?,
        Command::Seed { urls } => run_seed(&config, &urls)?,
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::new("trawler=info,warn"),
        1 => EnvFilter::new("trawler=debug,info"),
        2 => EnvFilter::new("trawler=trace,debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn open_store(config: &Config) -> trawler::Result<Arc<Mutex<SqliteStorage>>> {
    let store = SqliteStorage::open(Path::new(&config.storage.database_path))?;
    Ok(Arc::new(Mutex::new(store)))
}

fn build_frontier(
    store: Arc<Mutex<SqliteStorage>>,
    config: &Config,
) -> trawler::Result<UrlFrontier<SqliteStorage>> {
    UrlFrontier::new(
        store,
        &config.frontier,
        config.hosts.clone(),
        config.fetch.user_agent.clone(),
    )
}

async fn run_fetcher(config: Config) -> trawler::Result<()> {
    let store = open_store(&config)?;
    let mut frontier = build_frontier(store, &config)?;
    frontier.recover_fetching()?;

    let mut fetcher = PageFetcher::new(frontier, config.fetch.clone(), FaultReporter::log())?;
    fetcher.run(StopSignal::hooked_to_ctrl_c()).await?;
    tracing::info!("Fetcher stopped cleanly");
    Ok(())
}

async fn run_refresher(config: Config) -> trawler::Result<()> {
    let store = open_store(&config)?;
    let registry = HostRegistry::new(store, config.hosts.clone());

    let mut refresher = HostRefresher::new(registry, &config.fetch, FaultReporter::log())?;
    refresher.run(StopSignal::hooked_to_ctrl_c()).await?;
    tracing::info!("Host refresher stopped cleanly");
    Ok(())
}

async fn run_scraper(config: Config) -> trawler::Result<()> {
    let store = open_store(&config)?;
    let mut frontier = build_frontier(Arc::clone(&store), &config)?;
    frontier.recover_scraping()?;
    let frontier = Arc::new(Mutex::new(frontier));

    let scrapers: Vec<Box<dyn Scraper>> = vec![
        Box::new(UrlScraper::new(
            Arc::clone(&frontier),
            LinkFilter::new(config.filters.clone()),
        )),
        Box::new(MicrodataScraper::new(store)),
    ];

    let mut runner = ScrapeRunner::new(frontier, scrapers, FaultReporter::log());
    runner.run(StopSignal::hooked_to_ctrl_c()).await?;
    tracing::info!("Scraper stopped cleanly");
    Ok(())
}

fn run_report(config: &Config) -> trawler::Result<()> {
    let store = SqliteStorage::open(Path::new(&config.storage.database_path))?;
    println!("Database: {}\n", config.storage.database_path);
    let report = load_report(&store)?;
    print_report(&report);
    Ok(())
}

fn run_seed(config: &Config, urls: &[String]) -> trawler::Result<()> {
    let mut parsed = Vec::with_capacity(urls.len());
    for url in urls {
        parsed.push(Url::parse(url)?);
    }

    let store = open_store(config)?;
    let mut frontier = build_frontier(store, config)?;
    let added = frontier.add_urls(&parsed)?;
    frontier.drain();

    println!("Seeded {} new URLs ({} given)", added, urls.len());
    Ok(())
}

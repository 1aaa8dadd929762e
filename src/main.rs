//! Catalog-Harvest main entry point
//!
//! This is the command-line interface for the Catalog-Harvest dataset harvester.

use anyhow::Context;
use catalog_harvest::config::{load_config_with_hash, validate, Config};
use catalog_harvest::crawler::run_harvest;
use catalog_harvest::output::print_report;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Below this interval the harvester is no longer polite to the portal
const POLITE_INTERVAL_MS: u64 = 1000;

/// Catalog-Harvest: a polite dataset catalog harvester
///
/// Walks the listing pages of a CKAN-style data portal for one tag, visits
/// every dataset page once, and appends one JSON record per dataset to a
/// JSON Lines file.
#[derive(Parser, Debug)]
#[command(name = "catalog-harvest")]
#[command(version)]
#[command(about = "A polite dataset catalog harvester", long_about = None)]
struct Cli {
    /// Tag to harvest
    #[arg(short, long)]
    tag: String,

    /// JSON Lines output file (records are appended)
    #[arg(short, long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Override the catalog origin
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Override the minimum delay between requests (milliseconds)
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,

    /// Also visit resource sub-pages of each dataset
    #[arg(long)]
    follow_resources: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load_effective_config(&cli)?;

    let out_path = cli
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.path));

    tracing::info!(
        "Harvesting tag '{}' into {}",
        cli.tag,
        out_path.display()
    );

    let report = run_harvest(&config, &cli.tag, &out_path)
        .await
        .with_context(|| format!("harvest of tag '{}' failed", cli.tag))?;

    if !cli.quiet {
        print_report(&report);
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
            0 => EnvFilter::new("catalog_harvest=info,warn"),
            1 => EnvFilter::new("catalog_harvest=debug,info"),
            2 => EnvFilter::new("catalog_harvest=trace,debug"),
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

/// Loads the config file (if any), applies command-line overrides, and validates
fn load_effective_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(base_url) = &cli.base_url {
        config.crawler.base_url = base_url.clone();
    }
    if let Some(delay_ms) = cli.delay_ms {
        config.crawler.min_interval_ms = delay_ms;
    }
    if cli.follow_resources {
        config.crawler.follow_resources = true;
    }

    validate(&config).context("invalid configuration")?;

    if config.crawler.min_interval_ms < POLITE_INTERVAL_MS {
        tracing::warn!(
            "Minimum interval of {}ms is below {}ms; the portal may throttle or block this client",
            config.crawler.min_interval_ms,
            POLITE_INTERVAL_MS
        );
    }

    Ok(config)
}

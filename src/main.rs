//! medprice main entry point
//!
//! This is the command-line interface for the medprice price aggregator.

use anyhow::Context;
use clap::Parser;
use medprice::config::{load_config_with_hash, Config};
use medprice::{no_results_message, Aggregator, ResultRecord};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// medprice: compare medicine prices across pharmacy websites
///
/// Queries every enabled pharmacy in the source catalog at once and prints
/// the best-matching listings from each.
#[derive(Parser, Debug)]
#[command(name = "medprice")]
#[command(version = "1.0.0")]
#[command(about = "Compare medicine prices across pharmacies", long_about = None)]
struct Cli {
    /// Medicine name to search for
    #[arg(value_name = "QUERY", num_args = 0..)]
    query: Vec<String>,

    /// Path to TOML engine settings (defaults apply when omitted)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Path to the JSON source catalog (overrides catalog-path)
    #[arg(long, value_name = "PATH")]
    catalog: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Show settings and the loaded catalog without searching
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

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
    if let Some(catalog) = cli.catalog {
        config.engine.catalog_path = catalog;
    }

    let aggregator = Aggregator::from_config(&config).context("failed to start engine")?;

    if cli.dry_run {
        handle_dry_run(&config, &aggregator);
        return Ok(ExitCode::SUCCESS);
    }

    let query = cli.query.join(" ");
    handle_search(&aggregator, &query, cli.json).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("medprice=warn,warn"),
            1 => EnvFilter::new("medprice=info,warn"),
            2 => EnvFilter::new("medprice=debug,info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows settings and catalog
fn handle_dry_run(config: &Config, aggregator: &Aggregator) {
    println!("=== medprice Dry Run ===\n");

    println!("Engine:");
    println!("  Catalog: {}", config.engine.catalog_path.display());
    println!("  Request timeout: {}s", config.engine.request_timeout_secs);
    println!(
        "  Retries: {} (backoff unit {}ms)",
        config.engine.max_retries, config.engine.backoff_unit_ms
    );
    println!("  Cache TTL: {}s", config.engine.cache_ttl_secs);
    println!("  Search deadline: {}s", config.engine.search_deadline_secs);

    println!("\nMatching:");
    println!("  Threshold: {}", config.matching.threshold);
    println!("  Min match ratio: {}", config.matching.min_match_ratio);
    println!(
        "  Max results per source: {}",
        config.matching.max_results_per_source
    );

    let catalog = aggregator.catalog();
    if let Some(error) = catalog.load_error() {
        println!("\n✗ Catalog unavailable: {}", error);
        return;
    }

    println!("\nSources ({}):", catalog.len());
    for source in catalog.sources() {
        let state = if source.enabled { "enabled" } else { "disabled" };
        println!("  - {} [{}] {}", source.id, state, source.url_template);
    }
    for rejected in catalog.rejected() {
        println!("  ✗ {}", rejected);
    }

    println!(
        "\n✓ Would query {} sources",
        catalog.enabled_sources().count()
    );
}

/// Handles the main search operation
async fn handle_search(
    aggregator: &Aggregator,
    query: &str,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let records = match aggregator.search(query).await {
        Ok(records) => records,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else if records.is_empty() {
        println!("{}", no_results_message(query));
    } else {
        print_records(&records);
    }

    Ok(ExitCode::SUCCESS)
}

fn print_records(records: &[ResultRecord]) {
    for record in records {
        println!(
            "{:<16} {:>10}  {}",
            record.source_id, record.price, record.drug_name
        );
        if let Some(link) = &record.link {
            println!("{:<16} {:>10}  {}", "", "", link);
        }
    }
}

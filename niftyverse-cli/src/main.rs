//! niftyverse CLI: build the NSE large/mid/small-cap ticker universe.
//!
//! Fetches each bucket's index constituents, tops short buckets up from the
//! NIFTY 500 by market cap, and writes one `ticker` CSV per bucket plus a
//! `report.json` into the output directory.

use anyhow::{Context, Result};
use clap::Parser;
use niftyverse_core::{HttpClient, MarketCapRanker, TableFetcher, YahooMarketCap};
use niftyverse_runner::{run_universe, BucketBuilder, StdoutProgress, UniverseConfig};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "niftyverse",
    about = "Build NSE market-cap bucket ticker lists"
)]
struct Cli {
    /// Minimum tickers per bucket. Defaults to 100.
    #[arg(long)]
    min: Option<usize>,

    /// TOML file overriding the built-in sources and settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output directory for bucket CSVs. Defaults to ./config.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Look up market caps in parallel.
    #[arg(long, default_value_t = false)]
    parallel_lookups: bool,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, default_value_t = false, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let config = load_config(&cli)?;
    config.validate()?;

    let http = HttpClient::new(config.fetch.timeout()).context("failed to build HTTP client")?;
    let fetcher = TableFetcher::new(http, config.fetch.policy());
    let yahoo =
        YahooMarketCap::new(config.fetch.timeout()).context("failed to build market-cap client")?;
    let ranker = MarketCapRanker::new(yahoo).with_parallelism(config.parallel_lookups);
    let builder = BucketBuilder::new(fetcher, ranker, config.reference_url.clone());

    let report = run_universe(&config, &builder, &StdoutProgress)
        .context("universe build failed")?;

    let short = report.short_buckets().count();
    if short > 0 {
        println!("{short} bucket(s) ended below their minimum");
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<UniverseConfig> {
    let mut config = match &cli.config {
        Some(path) => UniverseConfig::from_file(path)?,
        None => UniverseConfig::default(),
    };
    if let Some(min) = cli.min {
        config = config.with_min_count(min);
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if cli.parallel_lookups {
        config.parallel_lookups = true;
    }
    Ok(config)
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

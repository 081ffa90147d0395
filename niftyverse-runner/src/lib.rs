//! niftyverse runner: bucket orchestration on top of `niftyverse-core`.
//!
//! This crate provides:
//! - TOML configuration with the built-in NSE index sources
//! - The per-bucket build: fetch, extract, market-cap top-up
//! - Bucket CSV artifacts and the run report
//! - `run_universe`, the sequential all-buckets entry point used by the CLI

pub mod bucket;
pub mod builder;
pub mod config;
pub mod export;
pub mod report;
pub mod run;

pub use bucket::{Bucket, BucketOutcome, TopUpStats};
pub use builder::{top_up, BucketBuilder, BuildError, TopUp};
pub use config::{BucketConfig, ConfigError, FetchSettings, UniverseConfig};
pub use export::{export_symbols_csv, write_bucket_csv, TICKER_HEADER};
pub use report::{write_report, BucketSummary, RunReport, REPORT_FILE};
pub use run::{run_universe, BuildProgress, SilentProgress, StdoutProgress};

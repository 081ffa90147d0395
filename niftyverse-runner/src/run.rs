//! Sequential all-buckets run.

use crate::bucket::{Bucket, BucketOutcome};
use crate::builder::{BucketBuilder, BuildError};
use crate::config::UniverseConfig;
use crate::export::write_bucket_csv;
use crate::report::{write_report, RunReport, REPORT_FILE};
use chrono::Utc;
use niftyverse_core::{FetchTable, MarketCapProvider};
use std::path::Path;
use tracing::info;

/// Progress callback for a universe run.
pub trait BuildProgress {
    /// Called before a bucket's source is fetched.
    fn on_bucket_start(&self, bucket: &Bucket, index: usize, total: usize);

    /// Called after a bucket's file has been written.
    fn on_bucket_saved(&self, outcome: &BucketOutcome, path: &Path);
}

/// Prints one line per milestone to stdout.
pub struct StdoutProgress;

impl BuildProgress for StdoutProgress {
    fn on_bucket_start(&self, bucket: &Bucket, index: usize, total: usize) {
        println!(
            "[{}/{}] Building {} from {}",
            index + 1,
            total,
            bucket.name,
            bucket.source_url
        );
    }

    fn on_bucket_saved(&self, outcome: &BucketOutcome, path: &Path) {
        println!("Saved {} tickers to {}", outcome.symbols.len(), path.display());
    }
}

/// Reports nothing.
pub struct SilentProgress;

impl BuildProgress for SilentProgress {
    fn on_bucket_start(&self, _bucket: &Bucket, _index: usize, _total: usize) {}

    fn on_bucket_saved(&self, _outcome: &BucketOutcome, _path: &Path) {}
}

/// Build every configured bucket in order and write its CSV, then the run
/// report.
///
/// The first error aborts the run. Files written for earlier buckets are
/// left in place; nothing is written for the failing bucket, and no report
/// is written.
pub fn run_universe<F, P>(
    config: &UniverseConfig,
    builder: &BucketBuilder<F, P>,
    progress: &dyn BuildProgress,
) -> Result<RunReport, BuildError>
where
    F: FetchTable,
    P: MarketCapProvider,
{
    let out_dir = &config.output_dir;
    std::fs::create_dir_all(out_dir).map_err(|source| BuildError::Io {
        path: out_dir.clone(),
        source,
    })?;

    let buckets = config.buckets();
    let total = buckets.len();
    let mut report = RunReport::new(Utc::now());

    for (index, bucket) in buckets.iter().enumerate() {
        progress.on_bucket_start(bucket, index, total);
        let outcome = builder.build(bucket)?;

        let path = out_dir.join(&bucket.output);
        write_bucket_csv(&path, &outcome.symbols)?;
        info!(bucket = %bucket.name, tickers = outcome.symbols.len(), path = %path.display(), "saved bucket");
        progress.on_bucket_saved(&outcome, &path);
        report.push(&outcome);
    }

    write_report(&out_dir.join(REPORT_FILE), &report)?;
    Ok(report)
}

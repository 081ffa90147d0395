//! Per-bucket build: fetch the constituent table, extract tickers, and top
//! up from the reference universe when the bucket is short.

use crate::bucket::{Bucket, BucketOutcome, TopUpStats};
use niftyverse_core::{
    extract_symbols, FetchError, FetchTable, MarketCapProvider, MarketCapRanker,
    NoSymbolColumnError, SymbolList,
};
use std::cell::RefCell;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

/// Fatal errors that abort a run.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("{url}: {source}")]
    NoSymbolColumn {
        url: String,
        #[source]
        source: NoSymbolColumnError,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to encode {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        source: csv::Error,
    },

    #[error("failed to serialize run report: {0}")]
    Report(#[from] serde_json::Error),
}

/// A topped-up symbol list and what it took to get there.
#[derive(Debug, Clone, PartialEq)]
pub struct TopUp {
    pub symbols: SymbolList,
    pub stats: TopUpStats,
}

/// Append the largest reference symbols not already in `base` until it holds
/// `minimum` symbols or the ranked candidates run out.
///
/// `base` keeps its order and is always a prefix of the result.
pub fn top_up<P: MarketCapProvider>(
    base: SymbolList,
    reference: &SymbolList,
    minimum: usize,
    ranker: &MarketCapRanker<P>,
) -> TopUp {
    let complement = reference.difference(&base);
    let ranking = ranker.rank(&complement);
    let need = minimum.saturating_sub(base.len());

    let mut symbols = base;
    let before = symbols.len();
    symbols.extend(ranking.top(need).cloned());
    let appended = symbols.len() - before;

    if appended < need {
        warn!(
            final_count = symbols.len(),
            minimum,
            need,
            appended,
            ranked = ranking.ranked.len(),
            missing = ranking.missing,
            failed = ranking.failed,
            "not enough ranked candidates to reach minimum"
        );
    }

    TopUp {
        symbols,
        stats: TopUpStats {
            reference_size: reference.len(),
            candidates: complement.len(),
            ranked: ranking.ranked.len(),
            missing: ranking.missing,
            failed: ranking.failed,
            appended,
        },
    }
}

/// Builds buckets against one fetcher and one market-cap ranker.
///
/// The reference universe is fetched on first need and reused for the rest
/// of the builder's life.
pub struct BucketBuilder<F, P> {
    fetcher: F,
    ranker: MarketCapRanker<P>,
    reference_url: String,
    reference: RefCell<Option<SymbolList>>,
}

impl<F: FetchTable, P: MarketCapProvider> BucketBuilder<F, P> {
    pub fn new(fetcher: F, ranker: MarketCapRanker<P>, reference_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            ranker,
            reference_url: reference_url.into(),
            reference: RefCell::new(None),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn ranker(&self) -> &MarketCapRanker<P> {
        &self.ranker
    }

    pub fn reference_url(&self) -> &str {
        &self.reference_url
    }

    /// Build one bucket's symbol list.
    pub fn build(&self, bucket: &Bucket) -> Result<BucketOutcome, BuildError> {
        let base = self.load_symbols(&bucket.source_url)?;
        let base_count = base.len();
        info!(bucket = %bucket.name, symbols = base_count, "extracted constituents");

        if base_count >= bucket.min_count {
            return Ok(BucketOutcome {
                name: bucket.name.clone(),
                output: bucket.output.clone(),
                min_count: bucket.min_count,
                base_count,
                top_up: None,
                symbols: base,
            });
        }

        info!(
            bucket = %bucket.name,
            have = base_count,
            min = bucket.min_count,
            "below minimum, topping up by market cap"
        );
        let reference = self.reference_universe()?;
        let TopUp { symbols, stats } = top_up(base, &reference, bucket.min_count, &self.ranker);
        info!(bucket = %bucket.name, appended = stats.appended, total = symbols.len(), "top-up done");

        Ok(BucketOutcome {
            name: bucket.name.clone(),
            output: bucket.output.clone(),
            min_count: bucket.min_count,
            base_count,
            top_up: Some(stats),
            symbols,
        })
    }

    /// Fetch `url` and extract its normalized, de-duplicated tickers.
    pub fn load_symbols(&self, url: &str) -> Result<SymbolList, BuildError> {
        let table = self.fetcher.fetch_table(url)?;
        extract_symbols(&table).map_err(|source| BuildError::NoSymbolColumn {
            url: url.to_string(),
            source,
        })
    }

    /// The reference universe, fetched at most once.
    pub fn reference_universe(&self) -> Result<SymbolList, BuildError> {
        if let Some(cached) = self.reference.borrow().as_ref() {
            return Ok(cached.clone());
        }
        let symbols = self.load_symbols(&self.reference_url)?;
        info!(symbols = symbols.len(), "loaded reference universe");
        *self.reference.borrow_mut() = Some(symbols.clone());
        Ok(symbols)
    }
}

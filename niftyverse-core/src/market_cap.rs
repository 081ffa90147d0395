//! Best-effort market-cap lookup and descending ranking.
//!
//! Every candidate gets exactly one pass: fast field first, the expensive
//! lookup only when the fast field is empty. A failed or empty lookup
//! excludes the candidate; nothing is retried and nothing aborts the batch.

use crate::error::LookupFailure;
use crate::symbol::{Symbol, SymbolList};
use rayon::prelude::*;
use tracing::{debug, warn};

/// Source of market capitalization figures.
///
/// `Ok(None)` means the provider answered but had no figure.
pub trait MarketCapProvider: Send + Sync {
    /// Cheap lookup, tried first.
    fn fast_market_cap(&self, symbol: &Symbol) -> Result<Option<f64>, LookupFailure>;

    /// Expensive lookup, tried only when the fast one yields nothing.
    fn full_market_cap(&self, symbol: &Symbol) -> Result<Option<f64>, LookupFailure>;
}

impl<T: MarketCapProvider + ?Sized> MarketCapProvider for &T {
    fn fast_market_cap(&self, symbol: &Symbol) -> Result<Option<f64>, LookupFailure> {
        (**self).fast_market_cap(symbol)
    }

    fn full_market_cap(&self, symbol: &Symbol) -> Result<Option<f64>, LookupFailure> {
        (**self).full_market_cap(symbol)
    }
}

/// A symbol with a usable capitalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    pub symbol: Symbol,
    pub market_cap: f64,
}

/// Ranking output plus the counts of what was dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking {
    /// Descending by `market_cap`; ties keep candidate order.
    pub ranked: Vec<RankedCandidate>,
    /// Candidates the provider had no figure for.
    pub missing: usize,
    /// Candidates whose lookup failed.
    pub failed: usize,
}

impl Ranking {
    /// The `n` largest symbols, in rank order.
    pub fn top(&self, n: usize) -> impl Iterator<Item = &Symbol> {
        self.ranked.iter().take(n).map(|c| &c.symbol)
    }

    /// Number of candidates that were looked up.
    pub fn candidates(&self) -> usize {
        self.ranked.len() + self.missing + self.failed
    }
}

/// Zero, negative and non-finite caps count as absent.
fn usable(cap: f64) -> bool {
    cap.is_finite() && cap > 0.0
}

/// Ranks candidate symbols by market capitalization.
#[derive(Debug, Clone)]
pub struct MarketCapRanker<P> {
    provider: P,
    parallel: bool,
}

impl<P: MarketCapProvider> MarketCapRanker<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            parallel: false,
        }
    }

    /// Look up candidates concurrently. Output is identical to the
    /// sequential path.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Single-attempt lookup: fast field, then the full lookup only when the
    /// fast field has no figure at all. An unusable figure from either path
    /// is absent.
    pub fn lookup(&self, symbol: &Symbol) -> Result<Option<f64>, LookupFailure> {
        let cap = match self.provider.fast_market_cap(symbol)? {
            Some(cap) => Some(cap),
            None => self.provider.full_market_cap(symbol)?,
        };
        Ok(cap.filter(|c| usable(*c)))
    }

    /// Rank `candidates` by descending market cap, excluding any without a
    /// usable figure.
    pub fn rank(&self, candidates: &SymbolList) -> Ranking {
        let lookups: Vec<Result<Option<f64>, LookupFailure>> = if self.parallel {
            candidates
                .as_slice()
                .par_iter()
                .map(|s| self.lookup(s))
                .collect()
        } else {
            candidates.iter().map(|s| self.lookup(s)).collect()
        };

        let mut ranking = Ranking::default();
        for (symbol, lookup) in candidates.iter().zip(lookups) {
            match lookup {
                Ok(Some(market_cap)) => ranking.ranked.push(RankedCandidate {
                    symbol: symbol.clone(),
                    market_cap,
                }),
                Ok(None) => ranking.missing += 1,
                Err(err) => {
                    debug!(%symbol, error = %err, "market cap lookup failed");
                    ranking.failed += 1;
                }
            }
        }

        ranking
            .ranked
            .sort_by(|a, b| b.market_cap.total_cmp(&a.market_cap));

        if ranking.failed > 0 && ranking.failed == candidates.len() {
            warn!(
                failed = ranking.failed,
                "every market cap lookup failed; provider may be unavailable"
            );
        } else if ranking.failed > 0 {
            debug!(
                failed = ranking.failed,
                missing = ranking.missing,
                ranked = ranking.ranked.len(),
                "market cap ranking finished with exclusions"
            );
        }

        ranking
    }
}

//! Bucket definitions and per-bucket build outcomes.

use niftyverse_core::SymbolList;
use serde::{Deserialize, Serialize};

/// A named index bucket: where its constituents come from and where the
/// result goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub name: String,
    pub source_url: String,
    /// File name inside the output directory.
    pub output: String,
    pub min_count: usize,
}

/// What the market-cap top-up did for one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopUpStats {
    /// Symbols in the reference universe.
    pub reference_size: usize,
    /// Reference symbols not already in the bucket.
    pub candidates: usize,
    /// Candidates with a usable market cap.
    pub ranked: usize,
    /// Candidates the provider had no figure for.
    pub missing: usize,
    /// Candidates whose lookup failed.
    pub failed: usize,
    /// Symbols appended to the bucket.
    pub appended: usize,
}

/// The finished symbol list for one bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketOutcome {
    pub name: String,
    pub output: String,
    pub min_count: usize,
    /// Unique symbols extracted from the bucket's own source.
    pub base_count: usize,
    /// `None` when the source already met the minimum.
    pub top_up: Option<TopUpStats>,
    pub symbols: SymbolList,
}

impl BucketOutcome {
    pub fn met_minimum(&self) -> bool {
        self.symbols.len() >= self.min_count
    }

    pub fn appended(&self) -> usize {
        self.top_up.as_ref().map_or(0, |t| t.appended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use niftyverse_core::Symbol;

    fn list(raw: &[&str]) -> SymbolList {
        raw.iter().filter_map(|s| Symbol::normalize(s)).collect()
    }

    #[test]
    fn met_minimum_compares_final_length() {
        let outcome = BucketOutcome {
            name: "midcap".into(),
            output: "midcap.csv".into(),
            min_count: 3,
            base_count: 2,
            top_up: Some(TopUpStats {
                appended: 1,
                ..TopUpStats::default()
            }),
            symbols: list(&["A", "B", "C"]),
        };
        assert!(outcome.met_minimum());
        assert_eq!(outcome.appended(), 1);

        let short = BucketOutcome {
            min_count: 4,
            ..outcome
        };
        assert!(!short.met_minimum());
    }
}

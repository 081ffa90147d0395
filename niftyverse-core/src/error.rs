//! Error types for table retrieval, column selection and cap lookups.
//!
//! Only `FetchError` and `NoSymbolColumnError` ever reach a caller of the
//! bucket pipeline. `AttemptError` lives inside the retry loop and
//! `LookupFailure` inside the ranker.

use thiserror::Error;

/// Failure of a single fetch attempt. Retried by `TableFetcher`.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV payload has no header row")]
    MissingHeader,

    #[error("row {row} has {fields} fields, header has {expected}")]
    RaggedRow {
        row: usize,
        fields: usize,
        expected: usize,
    },

    #[error("table has no data rows")]
    Empty,
}

/// Retries exhausted on a remote table fetch.
#[derive(Debug, Error)]
#[error("failed to fetch {url} after {attempts} attempt(s): {source}")]
pub struct FetchError {
    pub url: String,
    pub attempts: u32,
    #[source]
    pub source: AttemptError,
}

/// Neither the exact-name nor the heuristic phase picked a ticker column.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no ticker-like column found (columns: {})", .columns.join(", "))]
pub struct NoSymbolColumnError {
    pub columns: Vec<String>,
}

/// A single symbol's market-cap lookup went wrong.
#[derive(Debug, Error)]
pub enum LookupFailure {
    #[error("network error for {symbol}: {reason}")]
    Network { symbol: String, reason: String },

    #[error("HTTP {status} for {symbol}")]
    HttpStatus { symbol: String, status: u16 },

    #[error("response format changed for {symbol}: {reason}")]
    ResponseFormat { symbol: String, reason: String },

    #[error("could not get a session crumb for {symbol}: {reason}")]
    Session { symbol: String, reason: String },
}

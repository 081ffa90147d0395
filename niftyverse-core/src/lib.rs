//! niftyverse core: constituent tables, ticker symbols, market-cap ranking.
//!
//! This crate holds the data layer of the universe builder:
//! - Remote CSV retrieval with uniform-interval retries (`fetch`)
//! - A minimal column-oriented table model (`table`)
//! - Ticker normalization and order-preserving symbol lists (`symbol`)
//! - Two-phase ticker column selection (`extract`)
//! - Best-effort market-cap lookups and ranking (`market_cap`, `yahoo`)

pub mod error;
pub mod extract;
pub mod fetch;
pub mod market_cap;
pub mod symbol;
pub mod table;
pub mod yahoo;

pub use error::{AttemptError, FetchError, LookupFailure, NoSymbolColumnError};
pub use extract::{extract_symbols, select_column, ColumnKind, ColumnProfile};
pub use fetch::{FetchPolicy, FetchTable, HttpClient, HttpSource, TableFetcher};
pub use market_cap::{MarketCapProvider, MarketCapRanker, RankedCandidate, Ranking};
pub use symbol::{Symbol, SymbolList, EXCHANGE_SUFFIX};
pub use table::{is_missing, Column, Table, NA_TOKENS};
pub use yahoo::YahooMarketCap;

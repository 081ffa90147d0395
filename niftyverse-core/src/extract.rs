//! Ticker column selection and symbol extraction.
//!
//! Selection runs in two phases, each a pure function:
//! 1. exact header match against `PREFERRED_COLUMNS` (list order wins)
//! 2. first textual column, left to right, whose median cell length is
//!    below `MAX_MEDIAN_SYMBOL_LEN`
//!
//! Index publishers disagree on header spelling, hence the length heuristic.

use crate::error::NoSymbolColumnError;
use crate::symbol::{Symbol, SymbolList};
use crate::table::{Column, Table};

/// Header names known to hold tickers, in preference order.
pub const PREFERRED_COLUMNS: [&str; 5] = ["Symbol", "SYMBOL", "symbol", "Ticker", "ticker"];

/// Ticker columns have a median cell length strictly below this.
pub const MAX_MEDIAN_SYMBOL_LEN: f64 = 8.0;

/// Inferred type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Every present cell parses as a number.
    Numeric,
    /// At least one present cell is not a number.
    Textual,
    /// No present cells.
    Empty,
}

/// Metadata the heuristic phase works from.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    /// Median character length over present cells; `None` if not computable.
    pub median_len: Option<f64>,
}

impl ColumnProfile {
    pub fn of(column: &Column) -> Self {
        let mut lengths: Vec<usize> = column.present().map(|c| c.chars().count()).collect();
        let kind = if lengths.is_empty() {
            ColumnKind::Empty
        } else if column.present().all(is_numeric) {
            ColumnKind::Numeric
        } else {
            ColumnKind::Textual
        };
        lengths.sort_unstable();
        Self {
            name: column.name().to_string(),
            kind,
            median_len: median(&lengths),
        }
    }

    fn looks_like_tickers(&self) -> bool {
        self.kind == ColumnKind::Textual
            && self
                .median_len
                .is_some_and(|len| len < MAX_MEDIAN_SYMBOL_LEN)
    }
}

fn is_numeric(cell: &str) -> bool {
    let cell = cell.trim();
    // f64 parsing also accepts "inf" and "NAN"; requiring a digit keeps them
    // textual.
    cell.bytes().any(|b| b.is_ascii_digit()) && cell.parse::<f64>().is_ok()
}

fn median(sorted: &[usize]) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let mid = n / 2;
    if n % 2 == 1 {
        Some(sorted[mid] as f64)
    } else {
        Some((sorted[mid - 1] + sorted[mid]) as f64 / 2.0)
    }
}

/// Phase 1: index of the first column (in table order) named like the
/// highest-preference entry of `PREFERRED_COLUMNS` that is present.
pub fn select_by_name<S: AsRef<str>>(names: &[S]) -> Option<usize> {
    PREFERRED_COLUMNS
        .iter()
        .find_map(|wanted| names.iter().position(|n| n.as_ref() == *wanted))
}

/// Phase 2: index of the first textual, short-valued column.
pub fn select_by_profile(profiles: &[ColumnProfile]) -> Option<usize> {
    profiles.iter().position(ColumnProfile::looks_like_tickers)
}

/// Index of the ticker column, running both phases in order.
pub fn select_column(table: &Table) -> Option<usize> {
    select_by_name(&table.column_names()).or_else(|| {
        let profiles: Vec<ColumnProfile> = table.columns().iter().map(ColumnProfile::of).collect();
        select_by_profile(&profiles)
    })
}

/// Normalize and deduplicate one column's cells.
pub fn symbols_from_column(column: &Column) -> SymbolList {
    column.present().filter_map(Symbol::normalize).collect()
}

/// Locate the ticker column of `table` and return its normalized symbols.
pub fn extract_symbols(table: &Table) -> Result<SymbolList, NoSymbolColumnError> {
    let idx = select_column(table).ok_or_else(|| NoSymbolColumnError {
        columns: table.column_names().into_iter().map(String::from).collect(),
    })?;
    Ok(symbols_from_column(&table.columns()[idx]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str, kind: ColumnKind, median_len: Option<f64>) -> ColumnProfile {
        ColumnProfile {
            name: name.into(),
            kind,
            median_len,
        }
    }

    #[test]
    fn exact_match_uses_preference_order() {
        assert_eq!(select_by_name(&["ticker", "SYMBOL", "Name"]), Some(1));
        assert_eq!(select_by_name(&["symbol", "Symbol"]), Some(1));
        assert_eq!(select_by_name(&["Ticker"]), Some(0));
    }

    #[test]
    fn exact_match_is_case_sensitive() {
        assert_eq!(select_by_name(&["SyMbOl", "TICKER", "Symbols"]), None);
    }

    #[test]
    fn profile_selection_skips_long_numeric_and_unknown() {
        let profiles = vec![
            profile("Company Name", ColumnKind::Textual, Some(24.0)),
            profile("Weight", ColumnKind::Numeric, Some(4.0)),
            profile("Blank", ColumnKind::Empty, None),
            profile("Code", ColumnKind::Textual, Some(5.0)),
            profile("Series", ColumnKind::Textual, Some(2.0)),
        ];
        assert_eq!(select_by_profile(&profiles), Some(3));
    }

    #[test]
    fn profile_threshold_is_strict() {
        let profiles = vec![profile("Code", ColumnKind::Textual, Some(8.0))];
        assert_eq!(select_by_profile(&profiles), None);
    }

    #[test]
    fn profile_of_column() {
        let col = Column::from_values("Code", ["TCS", "INFY", "", "HDFCBANK"]);
        let p = ColumnProfile::of(&col);
        assert_eq!(p.kind, ColumnKind::Textual);
        assert_eq!(p.median_len, Some(4.0));

        let numeric = Column::from_values("Weight", ["1.5", "-2", "3e2"]);
        assert_eq!(ColumnProfile::of(&numeric).kind, ColumnKind::Numeric);

        let with_gap = Column::from_values("Code", ["500325", "NA"]);
        assert_eq!(ColumnProfile::of(&with_gap).kind, ColumnKind::Numeric);

        let empty = Column::from_values("Blank", ["", ""]);
        let p = ColumnProfile::of(&empty);
        assert_eq!(p.kind, ColumnKind::Empty);
        assert_eq!(p.median_len, None);
    }

    #[test]
    fn infinity_is_text() {
        let col = Column::from_values("Code", ["inf", "Infinity"]);
        assert_eq!(ColumnProfile::of(&col).kind, ColumnKind::Textual);
    }

    #[test]
    fn numeric_column_with_gaps_is_not_a_ticker_column() {
        let table = Table::parse_csv(
            "Company Name,Code,Ticker Code\n\
             Tata Consultancy Services Ltd.,500325,TCS\n\
             Infosys Ltd.,NA,INFY\n",
        )
        .unwrap();
        let symbols = extract_symbols(&table).unwrap();
        assert_eq!(symbols.to_strings(), vec!["TCS.NS", "INFY.NS"]);
    }

    #[test]
    fn na_cells_in_symbol_column_are_dropped() {
        let table = Table::parse_csv("Symbol\nTCS\nNA\nN/A\n").unwrap();
        assert_eq!(extract_symbols(&table).unwrap().to_strings(), vec!["TCS.NS"]);
    }

    #[test]
    fn exact_column_scenario() {
        let table = Table::from_columns(vec![
            Column::from_values("Company Name", ["Tata Consultancy", "Infosys", "HDFC Bank"]),
            Column::from_values("Symbol", ["TCS", "infy", " HDFC.NS "]),
        ])
        .unwrap();
        let symbols = extract_symbols(&table).unwrap();
        assert_eq!(symbols.to_strings(), vec!["TCS.NS", "INFY.NS", "HDFC.NS"]);
    }

    #[test]
    fn heuristic_fallback_scenario() {
        let table = Table::from_columns(vec![
            Column::from_values("Company Name", ["Tata Consultancy Services", "Infosys Limited"]),
            Column::from_values("ISIN", ["INE467B01029", "INE009A01021"]),
            Column::from_values("Weight", ["4.1", "3.2"]),
            Column::from_values("Code", ["tcs", "infy"]),
        ])
        .unwrap();
        let symbols = extract_symbols(&table).unwrap();
        assert_eq!(symbols.to_strings(), vec!["TCS.NS", "INFY.NS"]);
    }

    #[test]
    fn no_column_is_an_error() {
        let table = Table::from_columns(vec![
            Column::from_values("Company Name", ["Tata Consultancy Services", "Infosys Limited"]),
            Column::from_values("Weight", ["4.1", "3.2"]),
        ])
        .unwrap();
        let err = extract_symbols(&table).unwrap_err();
        assert_eq!(err.columns, vec!["Company Name", "Weight"]);
    }

    #[test]
    fn extraction_dedups_in_first_seen_order() {
        let table = Table::from_columns(vec![Column::from_values(
            "SYMBOL",
            ["SBIN", "TCS", "sbin", "TCS.NS", "", "ITC"],
        )])
        .unwrap();
        let symbols = extract_symbols(&table).unwrap();
        assert_eq!(symbols.to_strings(), vec!["SBIN.NS", "TCS.NS", "ITC.NS"]);
    }
}

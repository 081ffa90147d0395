//! Run report (JSON) written next to the bucket files.

use crate::bucket::{BucketOutcome, TopUpStats};
use crate::builder::BuildError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const REPORT_FILE: &str = "report.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketSummary {
    pub name: String,
    pub output: String,
    pub min_count: usize,
    pub base_count: usize,
    pub final_count: usize,
    pub met_minimum: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_up: Option<TopUpStats>,
}

impl From<&BucketOutcome> for BucketSummary {
    fn from(outcome: &BucketOutcome) -> Self {
        Self {
            name: outcome.name.clone(),
            output: outcome.output.clone(),
            min_count: outcome.min_count,
            base_count: outcome.base_count,
            final_count: outcome.symbols.len(),
            met_minimum: outcome.met_minimum(),
            top_up: outcome.top_up.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub buckets: Vec<BucketSummary>,
}

impl RunReport {
    pub fn new(generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            buckets: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: &BucketOutcome) {
        self.buckets.push(BucketSummary::from(outcome));
    }

    /// Buckets that ended below their minimum.
    pub fn short_buckets(&self) -> impl Iterator<Item = &BucketSummary> {
        self.buckets.iter().filter(|b| !b.met_minimum)
    }
}

pub fn write_report(path: &Path, report: &RunReport) -> Result<(), BuildError> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).map_err(|source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use niftyverse_core::{Symbol, SymbolList};

    fn outcome(name: &str, symbols: &[&str], min_count: usize) -> BucketOutcome {
        let symbols: SymbolList = symbols.iter().filter_map(|s| Symbol::normalize(s)).collect();
        BucketOutcome {
            name: name.into(),
            output: format!("{name}.csv"),
            min_count,
            base_count: symbols.len(),
            top_up: None,
            symbols,
        }
    }

    #[test]
    fn report_roundtrips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(REPORT_FILE);

        let mut report = RunReport::new(Utc::now());
        report.push(&outcome("largecap", &["TCS", "INFY"], 2));
        report.push(&outcome("midcap", &["ABB"], 3));
        write_report(&path, &report).unwrap();

        let loaded: RunReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, report);

        let short: Vec<&str> = loaded.short_buckets().map(|b| b.name.as_str()).collect();
        assert_eq!(short, vec!["midcap"]);
    }

    #[test]
    fn report_omits_symbols() {
        let mut report = RunReport::new(Utc::now());
        report.push(&outcome("largecap", &["TCS"], 1));
        let json = serde_json::to_string(&report).unwrap();
        assert!(!json.contains("TCS.NS"));
        assert!(json.contains("\"final_count\":1"));
    }
}

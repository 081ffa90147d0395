//! Universe configuration: sources, output location, fetch settings.
//!
//! Defaults reproduce the NSE setup (NIFTY 100 / Midcap 150 / Smallcap 250,
//! topped up from NIFTY 500). A TOML file may override any field; omitted
//! fields keep their defaults.

use crate::bucket::Bucket;
use niftyverse_core::FetchPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const NIFTY100_CSV: &str = "https://nsearchives.nseindia.com/content/indices/ind_nifty100list.csv";
pub const MIDCAP150_CSV: &str =
    "https://www.niftyindices.com/IndexConstituent/ind_niftymidcap150list.csv";
pub const SMALLCAP250_CSV: &str =
    "https://www.niftyindices.com/IndexConstituent/ind_niftysmallcap250list.csv";
pub const NIFTY500_CSV: &str = "https://www.niftyindices.com/IndexConstituent/ind_nifty500list.csv";

pub const DEFAULT_OUTPUT_DIR: &str = "config";
pub const DEFAULT_MIN_COUNT: usize = 100;

/// Errors loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// HTTP retry and timeout settings for table fetches and cap lookups.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchSettings {
    /// Attempts per table fetch.
    pub retries: u32,
    /// Seconds to wait between failed attempts.
    pub backoff_secs: f64,
    /// Per-request timeout in seconds.
    pub timeout_secs: f64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            retries: 3,
            backoff_secs: 1.0,
            timeout_secs: 20.0,
        }
    }
}

impl FetchSettings {
    pub fn policy(&self) -> FetchPolicy {
        let backoff = Duration::try_from_secs_f64(self.backoff_secs)
            .unwrap_or_else(|_| FetchPolicy::default().backoff);
        FetchPolicy::new(self.retries, backoff)
    }

    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs).unwrap_or(Duration::from_secs(20))
    }
}

/// One bucket as written in the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BucketConfig {
    pub name: String,
    pub url: String,
    /// File name inside the output directory.
    pub output: String,
    /// Overrides the top-level `min_count` for this bucket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_count: Option<usize>,
}

impl BucketConfig {
    fn new(name: &str, url: &str, output: &str) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            output: output.into(),
            min_count: None,
        }
    }
}

/// Complete run configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UniverseConfig {
    pub output_dir: PathBuf,
    pub min_count: usize,
    /// Broad universe used only to top up short buckets.
    pub reference_url: String,
    pub parallel_lookups: bool,
    pub fetch: FetchSettings,
    pub buckets: Vec<BucketConfig>,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            min_count: DEFAULT_MIN_COUNT,
            reference_url: NIFTY500_CSV.into(),
            parallel_lookups: false,
            fetch: FetchSettings::default(),
            buckets: vec![
                BucketConfig::new("largecap", NIFTY100_CSV, "largecap.csv"),
                BucketConfig::new("midcap", MIDCAP150_CSV, "midcap.csv"),
                BucketConfig::new("smallcap", SMALLCAP250_CSV, "smallcap.csv"),
            ],
        }
    }
}

impl UniverseConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply one minimum to every bucket, dropping per-bucket overrides.
    pub fn with_min_count(mut self, min_count: usize) -> Self {
        self.min_count = min_count;
        for bucket in &mut self.buckets {
            bucket.min_count = None;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buckets.is_empty() {
            return Err(ConfigError::Invalid("no buckets configured".into()));
        }
        if self.reference_url.trim().is_empty() {
            return Err(ConfigError::Invalid("reference_url is empty".into()));
        }
        if self.fetch.retries == 0 {
            return Err(ConfigError::Invalid("fetch.retries must be at least 1".into()));
        }
        if !(self.fetch.backoff_secs.is_finite() && self.fetch.backoff_secs >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "fetch.backoff_secs must be a non-negative number, got {}",
                self.fetch.backoff_secs
            )));
        }
        if !(self.fetch.timeout_secs.is_finite() && self.fetch.timeout_secs > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "fetch.timeout_secs must be positive, got {}",
                self.fetch.timeout_secs
            )));
        }

        let mut names = HashSet::new();
        let mut outputs = HashSet::new();
        for bucket in &self.buckets {
            if bucket.url.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "bucket '{}' has an empty url",
                    bucket.name
                )));
            }
            if bucket.output.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "bucket '{}' has an empty output name",
                    bucket.name
                )));
            }
            if !names.insert(bucket.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate bucket name '{}'",
                    bucket.name
                )));
            }
            if !outputs.insert(bucket.output.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate output '{}'",
                    bucket.output
                )));
            }
        }
        Ok(())
    }

    /// Resolved buckets, in configuration order.
    pub fn buckets(&self) -> Vec<Bucket> {
        self.buckets
            .iter()
            .map(|b| Bucket {
                name: b.name.clone(),
                source_url: b.url.clone(),
                output: b.output.clone(),
                min_count: b.min_count.unwrap_or(self.min_count),
            })
            .collect()
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_three_nse_buckets() {
        let config = UniverseConfig::default();
        let names: Vec<String> = config.buckets().into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["largecap", "midcap", "smallcap"]);
        assert_eq!(config.reference_url, NIFTY500_CSV);
        assert!(config.buckets().iter().all(|b| b.min_count == 100));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = UniverseConfig::from_toml(
            r#"
            output_dir = "out"
            [fetch]
            retries = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.fetch.retries, 5);
        assert_eq!(config.fetch.backoff_secs, 1.0);
        assert_eq!(config.buckets.len(), 3);
    }

    #[test]
    fn bucket_override_and_cli_min() {
        let config = UniverseConfig::from_toml(
            r#"
            min_count = 50
            [[buckets]]
            name = "microcap"
            url = "https://example.test/micro.csv"
            output = "micro.csv"
            min_count = 20

            [[buckets]]
            name = "largecap"
            url = "https://example.test/large.csv"
            output = "large.csv"
            "#,
        )
        .unwrap();
        let mins: Vec<usize> = config.buckets().iter().map(|b| b.min_count).collect();
        assert_eq!(mins, vec![20, 50]);

        let uniform = config.with_min_count(7);
        assert!(uniform.buckets().iter().all(|b| b.min_count == 7));
    }

    #[test]
    fn toml_roundtrip() {
        let config = UniverseConfig::default();
        let parsed = UniverseConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn rejects_duplicate_outputs() {
        let mut config = UniverseConfig::default();
        config.buckets[1].output = "largecap.csv".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate output"));
    }

    #[test]
    fn rejects_zero_retries_and_bad_timeouts() {
        let mut config = UniverseConfig::default();
        config.fetch.retries = 0;
        assert!(config.validate().is_err());

        let mut config = UniverseConfig::default();
        config.fetch.timeout_secs = 0.0;
        assert!(config.validate().is_err());

        let mut config = UniverseConfig::default();
        config.fetch.backoff_secs = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn settings_convert_to_durations() {
        let settings = FetchSettings {
            retries: 4,
            backoff_secs: 0.25,
            timeout_secs: 5.0,
        };
        assert_eq!(settings.policy(), FetchPolicy::new(4, Duration::from_millis(250)));
        assert_eq!(settings.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = UniverseConfig::from_file(Path::new("/nonexistent/niftyverse.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}

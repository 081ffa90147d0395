//! Remote table retrieval with uniform-interval retries.
//!
//! The transport is abstracted behind `HttpSource` so the retry and parse
//! path can be exercised without network access. Each attempt is
//! GET → lossy UTF-8 decode → CSV parse; a payload with zero data rows
//! counts as a failed attempt.

use crate::error::{AttemptError, FetchError};
use crate::table::Table;
use std::time::Duration;
use tracing::{debug, warn};

/// Generic browser identification; some index publishers reject bare clients.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Raw byte transport for table payloads.
pub trait HttpSource: Send + Sync {
    /// GET `url` and return the body. Non-success statuses are errors.
    fn get(&self, url: &str) -> Result<Vec<u8>, AttemptError>;
}

impl<T: HttpSource + ?Sized> HttpSource for &T {
    fn get(&self, url: &str) -> Result<Vec<u8>, AttemptError> {
        (**self).get(url)
    }
}

/// Blocking reqwest transport.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::blocking::Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(BROWSER_USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

impl HttpSource for HttpClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, AttemptError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| AttemptError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AttemptError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body = resp
            .bytes()
            .map_err(|e| AttemptError::Network(e.to_string()))?;
        Ok(body.to_vec())
    }
}

/// Retry budget for a table fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Total attempts. Zero is treated as one.
    pub retries: u32,
    /// Fixed sleep between failed attempts.
    pub backoff: Duration,
}

impl FetchPolicy {
    pub fn new(retries: u32, backoff: Duration) -> Self {
        Self { retries, backoff }
    }

    fn attempts(&self) -> u32 {
        self.retries.max(1)
    }
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

/// Anything that can turn a URL into a parsed table.
pub trait FetchTable {
    fn fetch_table(&self, url: &str) -> Result<Table, FetchError>;
}

impl<T: FetchTable + ?Sized> FetchTable for &T {
    fn fetch_table(&self, url: &str) -> Result<Table, FetchError> {
        (**self).fetch_table(url)
    }
}

/// Fetches and parses CSV tables through an `HttpSource`.
#[derive(Debug, Clone)]
pub struct TableFetcher<S> {
    source: S,
    policy: FetchPolicy,
}

impl<S: HttpSource> TableFetcher<S> {
    pub fn new(source: S, policy: FetchPolicy) -> Self {
        Self { source, policy }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn policy(&self) -> FetchPolicy {
        self.policy
    }

    /// Fetch `url`, retrying up to the policy's attempt budget.
    ///
    /// Sleeps `backoff` between failed attempts but never after the last
    /// one. The returned `FetchError` carries the last attempt's failure.
    pub fn fetch(&self, url: &str) -> Result<Table, FetchError> {
        let max_attempts = self.policy.attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.attempt(url) {
                Ok(table) => {
                    debug!(url, attempt, rows = table.row_count(), "fetched table");
                    return Ok(table);
                }
                Err(err) if attempt < max_attempts => {
                    warn!(url, attempt, max_attempts, error = %err, "fetch attempt failed, retrying");
                    std::thread::sleep(self.policy.backoff);
                }
                Err(err) => {
                    return Err(FetchError {
                        url: url.to_string(),
                        attempts: attempt,
                        source: err,
                    });
                }
            }
        }
    }

    fn attempt(&self, url: &str) -> Result<Table, AttemptError> {
        let body = self.source.get(url)?;
        let text = String::from_utf8_lossy(&body);
        Table::parse_csv(&text)
    }
}

impl<S: HttpSource> FetchTable for TableFetcher<S> {
    fn fetch_table(&self, url: &str) -> Result<Table, FetchError> {
        self.fetch(url)
    }
}

//! Yahoo Finance market-cap provider.
//!
//! Fast path is the v7 quote endpoint's `marketCap` field. The slow path is
//! the v10 quoteSummary endpoint (`price`, then `summaryDetail` modules).
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes; every deviation surfaces as a `LookupFailure` and the ranker
//! drops the symbol.

use crate::error::LookupFailure;
use crate::fetch::BROWSER_USER_AGENT;
use crate::market_cap::MarketCapProvider;
use crate::symbol::Symbol;
use reqwest::Url;
use serde::Deserialize;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

const QUOTE_URL: &str = "https://query1.finance.yahoo.com/v7/finance/quote";
const SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";

/// v7 quote response.
#[derive(Debug, Deserialize)]
struct QuoteEnvelope {
    #[serde(rename = "quoteResponse")]
    quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    result: Option<Vec<QuoteEntry>>,
}

#[derive(Debug, Deserialize)]
struct QuoteEntry {
    #[serde(rename = "marketCap")]
    market_cap: Option<f64>,
}

/// v10 quoteSummary response.
#[derive(Debug, Deserialize)]
struct SummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: SummaryResponse,
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    result: Option<Vec<SummaryModules>>,
    error: Option<SummaryError>,
}

#[derive(Debug, Deserialize)]
struct SummaryError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct SummaryModules {
    price: Option<CapModule>,
    #[serde(rename = "summaryDetail")]
    summary_detail: Option<CapModule>,
}

#[derive(Debug, Deserialize)]
struct CapModule {
    #[serde(rename = "marketCap")]
    market_cap: Option<RawNumber>,
}

/// Yahoo's `{ "raw": 1.0, "fmt": "1" }` wrapper. Sometimes `{}`.
#[derive(Debug, Deserialize)]
struct RawNumber {
    raw: Option<f64>,
}

/// Market cap from a v7 quote payload.
pub fn parse_quote_market_cap(symbol: &str, body: &str) -> Result<Option<f64>, LookupFailure> {
    let envelope: QuoteEnvelope =
        serde_json::from_str(body).map_err(|e| LookupFailure::ResponseFormat {
            symbol: symbol.to_string(),
            reason: e.to_string(),
        })?;
    Ok(envelope
        .quote_response
        .result
        .and_then(|r| r.into_iter().next())
        .and_then(|q| q.market_cap))
}

/// Market cap from a v10 quoteSummary payload.
pub fn parse_summary_market_cap(symbol: &str, body: &str) -> Result<Option<f64>, LookupFailure> {
    let envelope: SummaryEnvelope =
        serde_json::from_str(body).map_err(|e| LookupFailure::ResponseFormat {
            symbol: symbol.to_string(),
            reason: e.to_string(),
        })?;

    let summary = envelope.quote_summary;
    let Some(modules) = summary.result.and_then(|r| r.into_iter().next()) else {
        return match summary.error {
            Some(err) => Err(LookupFailure::ResponseFormat {
                symbol: symbol.to_string(),
                reason: format!("{}: {}", err.code, err.description),
            }),
            None => Ok(None),
        };
    };

    let from = |module: Option<CapModule>| module.and_then(|m| m.market_cap).and_then(|n| n.raw);
    Ok(from(modules.price).or_else(|| from(modules.summary_detail)))
}

/// The crumb from a `getcrumb` body. Rate-limit and consent pages come back
/// as HTML and yield `None`.
pub fn parse_crumb(body: &str) -> Option<String> {
    let crumb = body.trim();
    (!crumb.is_empty() && !crumb.contains('<') && !crumb.contains(char::is_whitespace))
        .then(|| crumb.to_string())
}

/// Yahoo Finance provider over a blocking HTTP client.
///
/// Both endpoints want a session cookie plus a matching `crumb` query
/// parameter. The crumb is fetched on first use and shared by every lookup
/// of this provider; a 401 or 403 drops it so the next lookup starts a fresh
/// session.
#[derive(Debug)]
pub struct YahooMarketCap {
    client: reqwest::blocking::Client,
    crumb: Mutex<Option<String>>,
}

impl YahooMarketCap {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(BROWSER_USER_AGENT)
            .cookie_store(true)
            .build()?;
        Ok(Self {
            client,
            crumb: Mutex::new(None),
        })
    }

    fn quote_url(symbol: &Symbol, crumb: &str) -> Result<Url, LookupFailure> {
        Url::parse_with_params(QUOTE_URL, &[("symbols", symbol.as_str()), ("crumb", crumb)])
            .map_err(|e| bad_url(symbol, e))
    }

    fn summary_url(symbol: &Symbol, crumb: &str) -> Result<Url, LookupFailure> {
        let mut url = Url::parse(SUMMARY_URL).map_err(|e| bad_url(symbol, e))?;
        url.path_segments_mut()
            .map_err(|()| bad_url(symbol, "base URL cannot take path segments"))?
            .push(symbol.as_str());
        url.query_pairs_mut()
            .append_pair("modules", "price,summaryDetail")
            .append_pair("crumb", crumb);
        Ok(url)
    }

    /// The session crumb, fetched once and then reused.
    fn crumb(&self, symbol: &Symbol) -> Result<String, LookupFailure> {
        let session = |reason: String| LookupFailure::Session {
            symbol: symbol.to_string(),
            reason,
        };

        let mut cached = self
            .crumb
            .lock()
            .map_err(|_| session("crumb lock poisoned".into()))?;
        if let Some(crumb) = cached.as_ref() {
            return Ok(crumb.clone());
        }

        // Any response sets the session cookie, the usual 404 included.
        self.client
            .get(COOKIE_URL)
            .send()
            .map_err(|e| session(e.to_string()))?;

        let resp = self
            .client
            .get(CRUMB_URL)
            .send()
            .map_err(|e| session(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(session(format!("crumb endpoint returned HTTP {}", status.as_u16())));
        }
        let body = resp.text().map_err(|e| session(e.to_string()))?;
        let crumb = parse_crumb(&body)
            .ok_or_else(|| session("crumb endpoint returned no crumb".into()))?;

        debug!("started Yahoo Finance session");
        *cached = Some(crumb.clone());
        Ok(crumb)
    }

    fn forget_crumb(&self) {
        if let Ok(mut cached) = self.crumb.lock() {
            *cached = None;
        }
    }

    fn get_text(&self, symbol: &Symbol, url: Url) -> Result<String, LookupFailure> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| LookupFailure::Network {
                symbol: symbol.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            if matches!(status.as_u16(), 401 | 403) {
                self.forget_crumb();
            }
            return Err(LookupFailure::HttpStatus {
                symbol: symbol.to_string(),
                status: status.as_u16(),
            });
        }

        resp.text().map_err(|e| LookupFailure::Network {
            symbol: symbol.to_string(),
            reason: e.to_string(),
        })
    }
}

fn bad_url(symbol: &Symbol, reason: impl std::fmt::Display) -> LookupFailure {
    LookupFailure::Network {
        symbol: symbol.to_string(),
        reason: format!("invalid request URL: {reason}"),
    }
}

impl MarketCapProvider for YahooMarketCap {
    fn fast_market_cap(&self, symbol: &Symbol) -> Result<Option<f64>, LookupFailure> {
        let url = Self::quote_url(symbol, &self.crumb(symbol)?)?;
        let body = self.get_text(symbol, url)?;
        parse_quote_market_cap(symbol.as_str(), &body)
    }

    fn full_market_cap(&self, symbol: &Symbol) -> Result<Option<f64>, LookupFailure> {
        let url = Self::summary_url(symbol, &self.crumb(symbol)?)?;
        let body = self.get_text(symbol, url)?;
        parse_summary_market_cap(symbol.as_str(), &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_market_cap() {
        let body = r#"{"quoteResponse":{"result":[{"symbol":"TCS.NS","marketCap":1.5e13}],"error":null}}"#;
        assert_eq!(parse_quote_market_cap("TCS.NS", body).unwrap(), Some(1.5e13));
    }

    #[test]
    fn quote_without_cap_is_absent() {
        let body = r#"{"quoteResponse":{"result":[{"symbol":"X.NS"}],"error":null}}"#;
        assert_eq!(parse_quote_market_cap("X.NS", body).unwrap(), None);
        let empty = r#"{"quoteResponse":{"result":[],"error":null}}"#;
        assert_eq!(parse_quote_market_cap("X.NS", empty).unwrap(), None);
    }

    #[test]
    fn quote_garbage_is_failure() {
        let err = parse_quote_market_cap("X.NS", "<html>").unwrap_err();
        assert!(matches!(err, LookupFailure::ResponseFormat { .. }));
    }

    #[test]
    fn summary_prefers_price_module() {
        let body = r#"{"quoteSummary":{"result":[{
            "price":{"marketCap":{"raw":200.0,"fmt":"200"}},
            "summaryDetail":{"marketCap":{"raw":100.0,"fmt":"100"}}
        }],"error":null}}"#;
        assert_eq!(parse_summary_market_cap("A.NS", body).unwrap(), Some(200.0));
    }

    #[test]
    fn summary_falls_back_to_detail_module() {
        let body = r#"{"quoteSummary":{"result":[{
            "price":{"marketCap":{}},
            "summaryDetail":{"marketCap":{"raw":100.0,"fmt":"100"}}
        }],"error":null}}"#;
        assert_eq!(parse_summary_market_cap("A.NS", body).unwrap(), Some(100.0));
    }

    #[test]
    fn summary_error_is_failure() {
        let body = r#"{"quoteSummary":{"result":null,"error":{"code":"Not Found","description":"Quote not found for symbol: ZZZ.NS"}}}"#;
        let err = parse_summary_market_cap("ZZZ.NS", body).unwrap_err();
        assert!(err.to_string().contains("Not Found"));
    }

    #[test]
    fn crumb_body_parsing() {
        assert_eq!(parse_crumb("aB3.xYz/9\n"), Some("aB3.xYz/9".to_string()));
        assert_eq!(parse_crumb(""), None);
        assert_eq!(parse_crumb("<html><body>Too Many Requests</body></html>"), None);
        assert_eq!(parse_crumb("Too Many Requests"), None);
    }

    fn pairs(url: &Url) -> Vec<(String, String)> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn quote_url_carries_symbol_and_crumb() {
        let sym = Symbol::normalize("tcs").unwrap();
        let url = YahooMarketCap::quote_url(&sym, "abc").unwrap();
        assert_eq!(url.path(), "/v7/finance/quote");
        assert_eq!(
            pairs(&url),
            vec![
                ("symbols".to_string(), "TCS.NS".to_string()),
                ("crumb".to_string(), "abc".to_string())
            ]
        );
    }

    #[test]
    fn ampersand_symbols_stay_one_parameter() {
        let sym = Symbol::normalize("M&M").unwrap();
        let url = YahooMarketCap::quote_url(&sym, "a/b=c").unwrap();
        assert_eq!(
            pairs(&url),
            vec![
                ("symbols".to_string(), "M&M.NS".to_string()),
                ("crumb".to_string(), "a/b=c".to_string())
            ]
        );
    }

    #[test]
    fn summary_url_keeps_symbol_in_one_segment() {
        let sym = Symbol::normalize("M&MFIN").unwrap();
        let url = YahooMarketCap::summary_url(&sym, "abc").unwrap();
        let segments: Vec<&str> = url.path_segments().unwrap().collect();
        assert_eq!(segments, vec!["v10", "finance", "quoteSummary", "M&MFIN.NS"]);
        assert_eq!(
            pairs(&url),
            vec![
                ("modules".to_string(), "price,summaryDetail".to_string()),
                ("crumb".to_string(), "abc".to_string())
            ]
        );
    }
}

//! Blocking Yahoo Finance quote client

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use std::thread;
use std::time::Duration;

use crate::config::SourceConfig;
use crate::error::SourceError;
use crate::source::{Quote, QuoteSource, SnapshotSource};

pub struct YahooQuoteSource {
    client: Client,
    config: SourceConfig,
}

impl YahooQuoteSource {
    pub fn new(config: SourceConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(YahooQuoteSource { client, config })
    }

    fn get_json(&self, url: &str) -> Result<Value, SourceError> {
        let resp = self.client.get(url).send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(resp.json()?)
    }

    /// Fetch every ticker in batches of `batch_size` and collect the results
    /// into a snapshot. A failed batch is logged and skipped, so its tickers
    /// are simply absent and show up later as failed lookups.
    pub fn fetch_snapshot(&self, tickers: &[String]) -> SnapshotSource {
        let mut snapshot = SnapshotSource::from_quotes(std::iter::empty());
        let urls = batch_urls(&self.config.base_url, tickers, self.config.batch_size);

        for (i, url) in urls.iter().enumerate() {
            if i > 0 && self.config.pause_ms > 0 {
                // polite pause to avoid throttling
                thread::sleep(Duration::from_millis(self.config.pause_ms));
            }

            let quotes = match self.get_json(url) {
                Ok(json) => parse_quote_response(&json),
                Err(e) => {
                    tracing::warn!(batch = i, error = %e, "quote batch failed, skipping");
                    continue;
                }
            };
            tracing::info!(batch = i, received = quotes.len(), "fetched quote batch");
            for quote in quotes {
                snapshot.insert(quote);
            }
        }

        snapshot
    }

    /// Add `days` sessions of close history for each ticker to `snapshot`.
    /// Tickers whose history cannot be fetched are logged and left without.
    pub fn fill_history(&self, snapshot: &mut SnapshotSource, tickers: &[String], days: usize) {
        for ticker in tickers {
            match self.closes(ticker, days) {
                Ok(closes) => snapshot.insert_closes(ticker, closes),
                Err(e) => tracing::warn!(ticker = %ticker, error = %e, "history fetch failed"),
            }
        }
    }
}

impl QuoteSource for YahooQuoteSource {
    fn quote(&self, ticker: &str) -> Result<Quote, SourceError> {
        let json = self.get_json(&quote_url(&self.config.base_url, &[ticker.to_string()]))?;
        parse_quote_response(&json)
            .into_iter()
            .find(|q| q.symbol.eq_ignore_ascii_case(ticker))
            .ok_or_else(|| SourceError::NotFound(ticker.to_string()))
    }

    fn closes(&self, ticker: &str, days: usize) -> Result<Vec<f64>, SourceError> {
        let json = self.get_json(&chart_url(&self.config.base_url, ticker, days))?;
        let mut closes = extract_close_prices(&json)
            .ok_or_else(|| SourceError::NotFound(ticker.to_string()))?;
        let start = closes.len().saturating_sub(days);
        Ok(closes.split_off(start))
    }
}

fn quote_url(base_url: &str, symbols: &[String]) -> String {
    format!(
        "{}/v7/finance/quote?symbols={}",
        base_url.trim_end_matches('/'),
        symbols.join(",")
    )
}

fn chart_url(base_url: &str, ticker: &str, days: usize) -> String {
    // Calendar range, padded for weekends and holidays
    let range_days = days * 7 / 5 + 5;
    format!(
        "{}/v8/finance/chart/{}?range={}d&interval=1d",
        base_url.trim_end_matches('/'),
        ticker,
        range_days
    )
}

/// One quote URL per batch of at most `batch_size` tickers. A zero batch
/// size is treated as one.
fn batch_urls(base_url: &str, tickers: &[String], batch_size: usize) -> Vec<String> {
    tickers
        .chunks(batch_size.max(1))
        .map(|chunk| quote_url(base_url, chunk))
        .collect()
}

/// Extract quotes from a `/v7/finance/quote` response body. Items that do
/// not deserialize are logged and skipped.
fn parse_quote_response(json: &Value) -> Vec<Quote> {
    let Some(results) = json["quoteResponse"]["result"].as_array() else {
        return Vec::new();
    };

    results
        .iter()
        .filter_map(|item| match Quote::deserialize(item) {
            Ok(quote) => Some(quote),
            Err(e) => {
                tracing::warn!(
                    symbol = item["symbol"].as_str().unwrap_or("?"),
                    error = %e,
                    "skipping malformed quote"
                );
                None
            }
        })
        .collect()
}

/// Extract daily closes from a `/v8/finance/chart` response body.
fn extract_close_prices(json: &Value) -> Option<Vec<f64>> {
    let result = json["chart"]["result"].as_array()?.first()?;
    let quotes = result["indicators"]["quote"].as_array()?.first()?;
    let closes = quotes["close"].as_array()?;

    Some(closes.iter().filter_map(|v| v.as_f64()).collect())
}

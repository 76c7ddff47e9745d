//! Quote records and the sources that supply them
//!
//! This module handles:
//! - The `Quote` record (Yahoo Finance field names)
//! - The `QuoteSource` seam the aggregators call through
//! - Daily close history for the volatility metrics
//! - Loading and persisting quote snapshots as JSON

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::error::SourceError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub regular_market_price: Option<f64>,
    #[serde(default)]
    pub post_market_price: Option<f64>,
    #[serde(default)]
    pub regular_market_previous_close: Option<f64>,
    #[serde(default)]
    pub dividend_yield: Option<f64>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
}

impl Quote {
    pub fn new(symbol: impl Into<String>) -> Self {
        Quote {
            symbol: symbol.into(),
            ..Default::default()
        }
    }

    pub fn exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = Some(exchange.into());
        self
    }

    pub fn price(mut self, price: f64) -> Self {
        self.regular_market_price = Some(price);
        self
    }

    pub fn previous_close(mut self, close: f64) -> Self {
        self.regular_market_previous_close = Some(close);
        self
    }

    pub fn dividend_yield(mut self, dividend_yield: f64) -> Self {
        self.dividend_yield = Some(dividend_yield);
        self
    }

    pub fn sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    /// Current unit price: regular market price, falling back to the
    /// post-market price. Non-finite values count as missing.
    pub fn unit_price(&self) -> Option<f64> {
        self.regular_market_price
            .filter(|p| p.is_finite())
            .or_else(|| self.post_market_price.filter(|p| p.is_finite()))
    }
}

/// Anything that can answer "what is the current quote for this ticker".
///
/// Lookups are blocking. Implementations report failure through
/// [`SourceError`]; the aggregators decide how to degrade.
pub trait QuoteSource {
    fn quote(&self, ticker: &str) -> Result<Quote, SourceError>;

    /// Daily closes for the last `days` sessions, oldest first. Sources
    /// without history report every ticker as not found.
    fn closes(&self, ticker: &str, days: usize) -> Result<Vec<f64>, SourceError> {
        let _ = days;
        Err(SourceError::NotFound(ticker.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub quote_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    metadata: SnapshotMetadata,
    quotes: Vec<Quote>,
    #[serde(default)]
    history: BTreeMap<String, Vec<f64>>,
}

/// Quotes held in memory, keyed by upper-cased symbol.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSource {
    quotes: HashMap<String, Quote>,
    history: HashMap<String, Vec<f64>>,
    generated_at: Option<DateTime<Utc>>,
}

impl SnapshotSource {
    pub fn from_quotes(quotes: impl IntoIterator<Item = Quote>) -> Self {
        let mut snapshot = SnapshotSource {
            quotes: HashMap::new(),
            history: HashMap::new(),
            generated_at: Some(Utc::now()),
        };
        for quote in quotes {
            snapshot.insert(quote);
        }
        snapshot
    }

    pub fn insert(&mut self, quote: Quote) {
        self.quotes.insert(quote.symbol.to_uppercase(), quote);
    }

    /// Record daily closes for `ticker`, oldest first.
    pub fn insert_closes(&mut self, ticker: &str, closes: Vec<f64>) {
        self.history.insert(ticker.to_uppercase(), closes);
    }

    pub fn with_closes(mut self, ticker: &str, closes: Vec<f64>) -> Self {
        self.insert_closes(ticker, closes);
        self
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn generated_at(&self) -> Option<DateTime<Utc>> {
        self.generated_at
    }

    /// Load a snapshot written by [`SnapshotSource::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let file: SnapshotFile = serde_json::from_str(&contents)?;

        tracing::debug!(
            path = %path.display(),
            quotes = file.quotes.len(),
            generated_at = %file.metadata.generated_at,
            "loaded quote snapshot"
        );

        let mut snapshot = SnapshotSource::from_quotes(file.quotes);
        for (ticker, closes) in file.history {
            snapshot.insert_closes(&ticker, closes);
        }
        snapshot.generated_at = Some(file.metadata.generated_at);
        Ok(snapshot)
    }

    /// Persist the snapshot. Writes to a sibling `.tmp` file and renames it
    /// into place.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SourceError> {
        let path = path.as_ref();
        let mut quotes: Vec<Quote> = self.quotes.values().cloned().collect();
        quotes.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        let file = SnapshotFile {
            metadata: SnapshotMetadata {
                generated_at: self.generated_at.unwrap_or_else(Utc::now),
                quote_count: quotes.len(),
            },
            quotes,
            history: self.history.clone().into_iter().collect(),
        };

        let mut tmp_path = path.as_os_str().to_owned();
        tmp_path.push(".tmp");
        fs::write(&tmp_path, serde_json::to_string_pretty(&file)?)?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

impl QuoteSource for SnapshotSource {
    fn quote(&self, ticker: &str) -> Result<Quote, SourceError> {
        self.quotes
            .get(&ticker.to_uppercase())
            .cloned()
            .ok_or_else(|| SourceError::NotFound(ticker.to_string()))
    }

    fn closes(&self, ticker: &str, days: usize) -> Result<Vec<f64>, SourceError> {
        let closes = self
            .history
            .get(&ticker.to_uppercase())
            .ok_or_else(|| SourceError::NotFound(ticker.to_string()))?;
        let start = closes.len().saturating_sub(days);
        Ok(closes[start..].to_vec())
    }
}

//! Holdings and position input validation

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{DiversificationError, DiversificationResult};

static TICKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9.\^=\-]{1,15}$").expect("ticker pattern is valid"));

/// Ticker to quantity, in the shape the aggregators take.
pub type Positions = BTreeMap<String, f64>;

/// A priced position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub ticker: String,
    pub quantity: f64,
    pub unit_price: f64,
}

impl Holding {
    pub fn new(ticker: impl Into<String>, quantity: f64, unit_price: f64) -> Self {
        Holding {
            ticker: ticker.into(),
            quantity,
            unit_price,
        }
    }

    pub fn invested_value(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

/// Trim and upper-case a ticker, rejecting anything that is not ticker-shaped.
pub fn normalize_ticker(raw: &str) -> DiversificationResult<String> {
    let ticker = raw.trim().to_uppercase();
    if TICKER_RE.is_match(&ticker) {
        Ok(ticker)
    } else {
        Err(DiversificationError::invalid_holding(raw.trim(), "not a valid ticker symbol"))
    }
}

/// Parse a `TICKER=QTY` argument.
pub fn parse_position(arg: &str) -> DiversificationResult<(String, f64)> {
    let Some((ticker, qty)) = arg.split_once('=') else {
        return Err(DiversificationError::invalid_holding(arg, "expected TICKER=QUANTITY"));
    };

    let ticker = normalize_ticker(ticker)?;
    let qty = qty.trim();
    let quantity: f64 = qty.parse().map_err(|_| {
        DiversificationError::invalid_holding(&ticker, format!("bad quantity '{}'", qty))
    })?;

    if !quantity.is_finite() || quantity < 0.0 {
        return Err(DiversificationError::invalid_holding(
            &ticker,
            format!("quantity must be a non-negative number, got {}", quantity),
        ));
    }
    Ok((ticker, quantity))
}

/// Keep only usable rows: non-blank ticker and a positive quantity.
/// Tickers are normalized and duplicates are merged by summing quantities.
pub fn valid_positions<'a>(rows: impl IntoIterator<Item = (&'a str, f64)>) -> Positions {
    let mut positions = Positions::new();
    for (raw, quantity) in rows {
        if raw.trim().is_empty() || quantity <= 0.0 || !quantity.is_finite() {
            continue;
        }
        match normalize_ticker(raw) {
            Ok(ticker) => *positions.entry(ticker).or_insert(0.0) += quantity,
            Err(e) => tracing::warn!(error = %e, "dropping position"),
        }
    }
    positions
}

/// Reject inputs the aggregators cannot work with, before any lookup is made.
pub(crate) fn check_positions(positions: &Positions) -> DiversificationResult<()> {
    if positions.is_empty() {
        return Err(DiversificationError::EmptyPortfolio);
    }
    for (ticker, &quantity) in positions {
        if !quantity.is_finite() || quantity < 0.0 {
            return Err(DiversificationError::invalid_holding(
                ticker,
                format!("quantity must be a non-negative number, got {}", quantity),
            ));
        }
    }
    Ok(())
}

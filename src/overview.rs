//! Portfolio headline metrics: value, concentration, daily move, volatility,
//! yield and sector allocation.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::diversification::{price_positions, total_investment, Diagnostic, PricedHolding};
use crate::error::DiversificationResult;
use crate::indicators;
use crate::portfolio::{check_positions, Positions};
use crate::source::QuoteSource;

pub const UNKNOWN_SECTOR: &str = "Unknown";
/// Sessions of close history behind the volatility figure.
pub const VOLATILITY_DAYS: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioOverview {
    pub total_value: f64,
    /// Number of holdings that could be priced.
    pub holdings: usize,
    pub top_holding: Option<String>,
    /// Value-weighted change against the previous close, in percent. `None`
    /// when no holding has a usable previous close.
    pub daily_change_pct: Option<f64>,
    /// Value-weighted standard deviation of daily returns over the last
    /// [`VOLATILITY_DAYS`] sessions, as a fraction. Holdings without history
    /// are left out; `None` when none has any.
    pub volatility: Option<f64>,
    /// Value-weighted dividend yield; holdings without one count as zero.
    pub dividend_yield: f64,
    /// Percentage of total value per sector.
    pub sectors: BTreeMap<String, f64>,
    pub diagnostics: Vec<Diagnostic>,
}

impl PortfolioOverview {
    pub fn sector_count(&self) -> usize {
        self.sectors.len()
    }
}

fn weighted_average(pairs: impl Iterator<Item = (f64, f64)>) -> Option<f64> {
    let (sum, weight) = pairs.fold((0.0, 0.0), |(s, w), (value, weight)| {
        (s + value * weight, w + weight)
    });
    (weight > 0.0).then(|| sum / weight)
}

fn daily_change(p: &PricedHolding) -> Option<f64> {
    let prev = p
        .quote
        .regular_market_previous_close
        .filter(|c| c.is_finite() && *c > 0.0)?;
    Some((p.holding.unit_price - prev) / prev * 100.0)
}

fn holding_volatility(p: &PricedHolding, source: &dyn QuoteSource) -> Option<f64> {
    let ticker = &p.holding.ticker;
    match source.closes(ticker, VOLATILITY_DAYS + 1) {
        Ok(closes) => indicators::volatility(&closes),
        Err(e) => {
            tracing::debug!(ticker = %ticker, error = %e, "no close history");
            None
        }
    }
}

pub fn build_overview(
    positions: &Positions,
    source: &dyn QuoteSource,
) -> DiversificationResult<PortfolioOverview> {
    check_positions(positions)?;

    let (priced, diagnostics) = price_positions(positions, source);
    let total = total_investment(&priced)?;

    let top_holding = priced
        .iter()
        .map(|p| &p.holding)
        .max_by(|a, b| a.invested_value().total_cmp(&b.invested_value()))
        .map(|h| h.ticker.clone());

    let daily_change_pct = weighted_average(
        priced
            .iter()
            .filter_map(|p| daily_change(p).map(|c| (c, p.holding.invested_value()))),
    );

    let volatility = weighted_average(priced.iter().filter_map(|p| {
        holding_volatility(p, source).map(|v| (v, p.holding.invested_value()))
    }));

    let dividend_yield = weighted_average(priced.iter().map(|p| {
        let dy = p.quote.dividend_yield.filter(|d| d.is_finite()).unwrap_or(0.0);
        (dy, p.holding.invested_value())
    }))
    .unwrap_or(0.0);

    let mut sectors: BTreeMap<String, f64> = BTreeMap::new();
    for p in &priced {
        let sector = p
            .quote
            .sector
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_SECTOR);
        *sectors.entry(sector.to_string()).or_insert(0.0) += p.holding.invested_value();
    }
    sectors.retain(|_, value| *value > 0.0);
    for value in sectors.values_mut() {
        *value = *value / total * 100.0;
    }

    Ok(PortfolioOverview {
        total_value: total,
        holdings: priced.len(),
        top_holding,
        daily_change_pct,
        volatility,
        dividend_yield,
        sectors,
        diagnostics,
    })
}

//! Regional diversification of a portfolio.
//!
//! Every position is priced through a [`QuoteSource`], one lookup per ticker,
//! in ticker order. Positions that cannot be priced are skipped and reported
//! as [`Diagnostic`]s; the call only fails when the input is unusable or
//! nothing at all could be priced.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::error::{DiversificationError, DiversificationResult};
use crate::portfolio::{check_positions, Holding, Positions};
use crate::region::{resolve_quote, Region, RegionResolution};
use crate::source::{Quote, QuoteSource};

/// Why a holding did not contribute cleanly to the result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The quote lookup failed; the holding was skipped.
    LookupFailed { ticker: String, reason: String },
    /// The quote had no positive price; the holding was skipped.
    Unpriced { ticker: String, price: Option<f64> },
    /// The holding was counted under `Other` because its exchange is unknown.
    UnknownRegion { ticker: String, label: String },
}

impl Diagnostic {
    pub fn ticker(&self) -> &str {
        match self {
            Diagnostic::LookupFailed { ticker, .. }
            | Diagnostic::Unpriced { ticker, .. }
            | Diagnostic::UnknownRegion { ticker, .. } => ticker,
        }
    }

    /// True when the holding was left out of the totals.
    pub fn is_skip(&self) -> bool {
        !matches!(self, Diagnostic::UnknownRegion { .. })
    }
}

/// A holding that was successfully priced, with the quote it was priced from.
#[derive(Debug, Clone)]
pub(crate) struct PricedHolding {
    pub holding: Holding,
    pub quote: Quote,
    pub resolution: RegionResolution,
}

/// Price every position. Returns the priced holdings and diagnostics for the
/// ones that were skipped or could not be placed in a region.
pub(crate) fn price_positions(
    positions: &Positions,
    source: &dyn QuoteSource,
) -> (Vec<PricedHolding>, Vec<Diagnostic>) {
    let mut priced = Vec::with_capacity(positions.len());
    let mut diagnostics = Vec::new();

    for (ticker, &quantity) in positions {
        let quote = match source.quote(ticker) {
            Ok(quote) => quote,
            Err(e) => {
                tracing::warn!(ticker = %ticker, error = %e, "quote lookup failed, skipping");
                diagnostics.push(Diagnostic::LookupFailed {
                    ticker: ticker.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let price = quote.unit_price().unwrap_or(0.0);
        if price <= 0.0 {
            tracing::warn!(ticker = %ticker, price, "no positive price, skipping");
            diagnostics.push(Diagnostic::Unpriced {
                ticker: ticker.clone(),
                price: quote.unit_price(),
            });
            continue;
        }

        let resolution = resolve_quote(&quote);
        if !resolution.is_matched() {
            diagnostics.push(Diagnostic::UnknownRegion {
                ticker: ticker.clone(),
                label: resolution.label(),
            });
        }

        tracing::debug!(
            ticker = %ticker,
            quantity,
            price,
            region = %resolution.region(),
            "priced holding"
        );
        priced.push(PricedHolding {
            holding: Holding::new(ticker.clone(), quantity, price),
            quote,
            resolution,
        });
    }

    (priced, diagnostics)
}

/// Sum of invested value, or an error if it is zero or not finite.
pub(crate) fn total_investment(priced: &[PricedHolding]) -> DiversificationResult<f64> {
    let total: f64 = priced.iter().map(|p| p.holding.invested_value()).sum();
    if !total.is_finite() {
        return Err(DiversificationError::calculation_failed(format!(
            "total investment is not finite ({})",
            total
        )));
    }
    if total <= 0.0 {
        return Err(DiversificationError::NoPricedHoldings);
    }
    Ok(total)
}

/// Invested value broken down by region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diversification {
    /// Percentage of total invested value (0-100) per region. Only regions
    /// with nonzero investment are present.
    pub allocations: BTreeMap<Region, f64>,
    /// Invested value per region.
    pub region_values: BTreeMap<Region, f64>,
    pub total_investment: f64,
    pub diagnostics: Vec<Diagnostic>,
}

impl Diversification {
    /// Percentage for `region`, zero if the portfolio has nothing there.
    pub fn percentage(&self, region: Region) -> f64 {
        self.allocations.get(&region).copied().unwrap_or(0.0)
    }

    /// Regions sorted by weight, largest first.
    pub fn sorted_by_weight(&self) -> Vec<(Region, f64)> {
        let mut result: Vec<_> = self.allocations.iter().map(|(r, p)| (*r, *p)).collect();
        result.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        result
    }

    /// Allocations keyed by region label.
    pub fn labelled(&self) -> BTreeMap<String, f64> {
        self.allocations
            .iter()
            .map(|(region, pct)| (region.label().to_string(), *pct))
            .collect()
    }

    /// Holdings that were left out of the totals.
    pub fn skipped(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_skip())
    }
}

/// Compute the share of invested value held in each region.
///
/// # Errors
///
/// - [`DiversificationError::EmptyPortfolio`] / [`DiversificationError::InvalidHolding`]
///   before any lookup is made.
/// - [`DiversificationError::NoPricedHoldings`] when no holding had a positive price.
/// - [`DiversificationError::CalculationFailed`] if the total overflows.
pub fn compute_diversification(
    positions: &Positions,
    source: &dyn QuoteSource,
) -> DiversificationResult<Diversification> {
    check_positions(positions)?;

    let (priced, diagnostics) = price_positions(positions, source);
    let total = total_investment(&priced)?;

    let mut region_values: BTreeMap<Region, f64> = BTreeMap::new();
    for p in &priced {
        *region_values.entry(p.resolution.region()).or_insert(0.0) += p.holding.invested_value();
    }
    region_values.retain(|_, value| *value > 0.0);

    let allocations = region_values
        .iter()
        .map(|(region, value)| (*region, value / total * 100.0))
        .collect();

    tracing::debug!(
        total,
        regions = region_values.len(),
        skipped = diagnostics.iter().filter(|d| d.is_skip()).count(),
        "computed diversification"
    );

    Ok(Diversification {
        allocations,
        region_values,
        total_investment: total,
        diagnostics,
    })
}

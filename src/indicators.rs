//! Price-history indicators over daily closes (oldest first).

use statrs::statistics::Statistics;

/// Day-over-day percentage changes as fractions. Pairs with a non-positive or
/// non-finite close are dropped.
pub fn pct_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .filter(|w| w[0].is_finite() && w[1].is_finite() && w[0] > 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

/// Population standard deviation of daily returns. `None` without at least
/// one return.
pub fn volatility(closes: &[f64]) -> Option<f64> {
    let returns = pct_returns(closes);
    if returns.is_empty() {
        return None;
    }
    Some(returns.iter().population_std_dev())
}

//! Error types for region classification and diversification.

use thiserror::Error;

/// Result type for diversification operations.
pub type DiversificationResult<T> = Result<T, DiversificationError>;

/// Errors returned by the aggregators.
///
/// Per-holding lookup failures are not errors: they are reported as
/// [`Diagnostic`](crate::diversification::Diagnostic) entries on a successful result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiversificationError {
    /// No positions were supplied.
    #[error("Input portfolio is empty")]
    EmptyPortfolio,

    /// A position failed validation before any lookup was made.
    #[error("Invalid holding '{ticker}': {reason}")]
    InvalidHolding {
        /// The offending ticker.
        ticker: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Every holding was skipped, so there is nothing to divide by.
    #[error("Total investment is zero. Cannot calculate diversification.")]
    NoPricedHoldings,

    /// Aggregation produced a value that cannot be turned into percentages.
    #[error("Error calculating diversification: {reason}")]
    CalculationFailed {
        /// What went wrong.
        reason: String,
    },
}

impl DiversificationError {
    /// Create an invalid holding error.
    #[must_use]
    pub fn invalid_holding(ticker: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidHolding {
            ticker: ticker.into(),
            reason: reason.into(),
        }
    }

    /// Create a calculation failed error.
    #[must_use]
    pub fn calculation_failed(reason: impl Into<String>) -> Self {
        Self::CalculationFailed {
            reason: reason.into(),
        }
    }

    /// True for errors caused by the caller's input rather than by market data.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::EmptyPortfolio | Self::InvalidHolding { .. })
    }
}

/// Errors raised by a [`QuoteSource`](crate::source::QuoteSource).
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request failed [CODE: {status}]: {body}")]
    Status { status: u16, body: String },

    #[error("malformed data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no quote for '{0}'")]
    NotFound(String),
}

//! Regional diversification of stock portfolios.
//!
//! Holdings are priced through a [`QuoteSource`], each listing exchange is
//! classified into a [`Region`], and invested value is aggregated into a
//! percentage breakdown.
//!
//! ```
//! use portfolio_regions::{compute_diversification, Positions, Quote, Region, SnapshotSource};
//!
//! let source = SnapshotSource::from_quotes([
//!     Quote::new("AAA").exchange("nasdaq").price(100.0),
//!     Quote::new("BBB").exchange("lse").price(100.0),
//! ]);
//! let positions: Positions = [("AAA".to_string(), 10.0), ("BBB".to_string(), 10.0)].into();
//!
//! let result = compute_diversification(&positions, &source).unwrap();
//! assert!((result.percentage(Region::American) - 50.0).abs() < 1e-9);
//! ```

pub mod config;
pub mod diversification;
pub mod error;
pub mod indicators;
pub mod overview;
pub mod portfolio;
pub mod region;
pub mod source;
pub mod yahoo;

pub use config::SourceConfig;
pub use diversification::{compute_diversification, Diagnostic, Diversification};
pub use error::{DiversificationError, DiversificationResult, SourceError};
pub use overview::{build_overview, PortfolioOverview};
pub use portfolio::{parse_position, valid_positions, Holding, Positions};
pub use region::{resolve_exchange, resolve_region, Region, RegionResolution};
pub use source::{Quote, QuoteSource, SnapshotSource};
pub use yahoo::YahooQuoteSource;

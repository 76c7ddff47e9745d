//! Exchange code to region classification
//!
//! Each region owns a static list of exchange-code fragments. A code is
//! classified by substring containment, checking regions in a fixed order:
//! American, European, Asian, then Other. The first hit wins, so overlapping
//! fragments (e.g. "ne" inside "euronext", "sto" listed twice) resolve to the
//! earlier region.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::source::{Quote, QuoteSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "American Stock")]
    American,
    #[serde(rename = "European Stock")]
    European,
    #[serde(rename = "Asian Stock")]
    Asian,
    #[serde(rename = "Other/Unknown Region")]
    Other,
}

const AMERICAN_EXCHANGES: &[&str] = &[
    "nasdaq", "nyse", "amex", "arca", "pcx", "nms", "nyq", "snp", "cboe", "bats", "tsx", "tsxv",
    "cse", "ne",
];

const EUROPEAN_EXCHANGES: &[&str] = &[
    "lse", "euronext", "xetra", "bme", "six", "fra", "ams", "par", "mil", "lis", "vse", "omx",
    "wse", "prague", "athens", "budapest", "bvx", "micex", "moex", "hel", "sto", "oslo", "dublin",
    "bolsa-madrid", "ger", "ebs",
];

const ASIAN_EXCHANGES: &[&str] = &[
    "tse", "sse", "hkex", "kospi", "kosdaq", "nse", "bse", "szse", "taiex", "jpxt", "hsi", "idx",
    "pse", "bursa-malaysia", "set", "hkg", "jpx", "tky", "sto", "shanghai", "shenzhen", "taipei",
    "karachi", "dhaka", "ksc", "nsi",
];

const OTHER_EXCHANGES: &[&str] = &[
    "asx", "nzx", "jse", "bvc", "bmv", "b3", "bovespa", "safex", "adx", "dfm", "tadawul", "qse",
    "egx", "casablanca", "nairobi", "lagos", "muscat", "doha", "kuwait", "manama", "colombia",
    "peru", "chile", "argentina",
];

impl Region {
    /// All regions in match priority order.
    pub const ALL: [Region; 4] = [
        Region::American,
        Region::European,
        Region::Asian,
        Region::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Region::American => "American Stock",
            Region::European => "European Stock",
            Region::Asian => "Asian Stock",
            Region::Other => "Other/Unknown Region",
        }
    }

    /// Exchange-code fragments that identify this region.
    pub fn exchanges(self) -> &'static [&'static str] {
        match self {
            Region::American => AMERICAN_EXCHANGES,
            Region::European => EUROPEAN_EXCHANGES,
            Region::Asian => ASIAN_EXCHANGES,
            Region::Other => OTHER_EXCHANGES,
        }
    }

    /// First region (in priority order) with a fragment contained in `code`.
    /// The code is lower-cased before matching.
    pub fn classify_exchange(code: &str) -> Option<Region> {
        let code = code.to_lowercase();
        Region::ALL
            .into_iter()
            .find(|region| region.exchanges().iter().any(|ex| code.contains(ex)))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of resolving one ticker's region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionResolution {
    Matched(Region),
    /// The exchange code matched none of the tables.
    Unrecognized { exchange: String },
    /// The exchange code could not be obtained.
    LookupFailed { ticker: String, reason: String },
}

impl RegionResolution {
    /// Region the holding is aggregated under. Anything unresolved is `Other`.
    pub fn region(&self) -> Region {
        match self {
            RegionResolution::Matched(region) => *region,
            _ => Region::Other,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, RegionResolution::Matched(_))
    }

    /// Human readable label, embedding the raw exchange or failure reason
    /// when the region could not be resolved.
    pub fn label(&self) -> String {
        match self {
            RegionResolution::Matched(region) => region.label().to_string(),
            RegionResolution::Unrecognized { exchange } => {
                format!("{} (Exchange: {})", Region::Other.label(), exchange)
            }
            RegionResolution::LookupFailed { ticker, reason } => {
                format!("Error fetching data for {}: {}", ticker, reason)
            }
        }
    }
}

impl fmt::Display for RegionResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Resolve an exchange code that is already known.
pub fn resolve_exchange(code: &str) -> RegionResolution {
    let code = code.to_lowercase();
    match Region::classify_exchange(&code) {
        Some(region) => RegionResolution::Matched(region),
        None => RegionResolution::Unrecognized { exchange: code },
    }
}

/// Resolve the region from a quote that was already fetched. A missing
/// exchange field is treated as an empty code.
pub fn resolve_quote(quote: &Quote) -> RegionResolution {
    resolve_exchange(quote.exchange.as_deref().unwrap_or(""))
}

/// Look up `ticker` in `source` and resolve its region. Never fails: a lookup
/// error becomes [`RegionResolution::LookupFailed`].
pub fn resolve_region(ticker: &str, source: &dyn QuoteSource) -> RegionResolution {
    match source.quote(ticker) {
        Ok(quote) => resolve_quote(&quote),
        Err(e) => {
            tracing::warn!(ticker, error = %e, "exchange lookup failed");
            RegionResolution::LookupFailed {
                ticker: ticker.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

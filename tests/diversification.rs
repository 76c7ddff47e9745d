//! End-to-end diversification scenarios over snapshot quotes.

use approx::assert_abs_diff_eq;
use portfolio_regions::{
    build_overview, compute_diversification, resolve_region, valid_positions, Diagnostic,
    DiversificationError, Positions, Quote, QuoteSource, Region, SnapshotSource, SourceError,
};

// =============================================================================
// FIXTURES
// =============================================================================

fn positions(items: &[(&str, f64)]) -> Positions {
    items.iter().map(|(t, q)| (t.to_string(), *q)).collect()
}

/// A mixed global book with one unlisted exchange and one stale quote.
fn global_source() -> SnapshotSource {
    SnapshotSource::from_quotes([
        Quote::new("AAPL").exchange("NMS").price(190.0).sector("Technology"),
        Quote::new("RY").exchange("NYQ").price(125.0).sector("Financial Services"),
        Quote::new("SAP.DE").exchange("GER").price(180.0).sector("Technology"),
        Quote::new("SHEL.L").exchange("LSE").price(27.0).sector("Energy"),
        Quote::new("7203.T").exchange("JPX").price(20.0).sector("Consumer Cyclical"),
        Quote::new("0700.HK").exchange("HKG").price(300.0).sector("Communication Services"),
        Quote::new("BHP.AX").exchange("ASX").price(45.0).sector("Basic Materials"),
        Quote::new("ODD").exchange("QQQ9").price(10.0),
        Quote::new("STALE").exchange("NMS").price(0.0),
    ])
}

struct FlakySource {
    inner: SnapshotSource,
    broken: &'static str,
}

impl QuoteSource for FlakySource {
    fn quote(&self, ticker: &str) -> Result<Quote, SourceError> {
        if ticker == self.broken {
            return Err(SourceError::Status {
                status: 500,
                body: "internal error".to_string(),
            });
        }
        self.inner.quote(ticker)
    }
}

// =============================================================================
// SCENARIOS
// =============================================================================

#[test]
fn single_nasdaq_holding_is_all_american() {
    let source = SnapshotSource::from_quotes([Quote::new("AAA").exchange("NASDAQ").price(100.0)]);

    assert_eq!(resolve_region("AAA", &source).label(), "American Stock");

    let result = compute_diversification(&positions(&[("AAA", 10.0)]), &source).unwrap();
    let labelled = result.labelled();
    assert_eq!(labelled.len(), 1);
    assert_abs_diff_eq!(labelled["American Stock"], 100.0, epsilon = 0.01);
}

#[test]
fn nasdaq_and_lse_split_evenly() {
    let source = SnapshotSource::from_quotes([
        Quote::new("AAA").exchange("nasdaq").price(100.0),
        Quote::new("BBB").exchange("lse").price(100.0),
    ]);
    let result =
        compute_diversification(&positions(&[("AAA", 10.0), ("BBB", 10.0)]), &source).unwrap();

    let labelled = result.labelled();
    assert_eq!(labelled.len(), 2);
    assert_abs_diff_eq!(labelled["American Stock"], 50.0, epsilon = 0.01);
    assert_abs_diff_eq!(labelled["European Stock"], 50.0, epsilon = 0.01);
}

#[test]
fn unrecognized_exchange_is_reported() {
    let source = SnapshotSource::from_quotes([Quote::new("CCC").exchange("xyz123").price(1.0)]);

    let resolution = resolve_region("CCC", &source);
    assert!(resolution.label().contains("xyz123"));
    assert_eq!(resolution.region(), Region::Other);

    let result = compute_diversification(&positions(&[("CCC", 1.0)]), &source).unwrap();
    assert_abs_diff_eq!(result.percentage(Region::Other), 100.0, epsilon = 0.01);
}

#[test]
fn empty_portfolio_is_an_error_value() {
    let source = global_source();
    let err = compute_diversification(&Positions::new(), &source).unwrap_err();
    assert_eq!(err, DiversificationError::EmptyPortfolio);
    assert!(err.is_invalid_input());
}

#[test]
fn all_unpriced_is_an_error_value() {
    let source = global_source();
    let err = compute_diversification(&positions(&[("STALE", 100.0), ("NOPE", 5.0)]), &source)
        .unwrap_err();
    assert_eq!(err, DiversificationError::NoPricedHoldings);
}

#[test]
fn single_region_portfolio_is_one_hundred_percent() {
    let source = global_source();
    let result = compute_diversification(
        &positions(&[("7203.T", 100.0), ("0700.HK", 3.0)]),
        &source,
    )
    .unwrap();
    assert_eq!(result.allocations.len(), 1);
    assert_abs_diff_eq!(result.percentage(Region::Asian), 100.0, epsilon = 0.01);
}

#[test]
fn global_book_percentages_sum_to_one_hundred() {
    let source = global_source();
    let book = positions(&[
        ("AAPL", 10.0),
        ("RY", 4.0),
        ("SAP.DE", 5.0),
        ("SHEL.L", 40.0),
        ("7203.T", 50.0),
        ("0700.HK", 2.0),
        ("BHP.AX", 20.0),
        ("ODD", 10.0),
        ("STALE", 1000.0),
    ]);
    let result = compute_diversification(&book, &source).unwrap();

    let total: f64 = result.allocations.values().sum();
    assert_abs_diff_eq!(total, 100.0, epsilon = 1e-9);

    // AAPL 1900 + RY 500 = 2400 American; SAP 900 + SHEL 1080 = 1980 European;
    // Toyota 1000 + Tencent 600 = 1600 Asian; BHP 900 + ODD 100 = 1000 Other.
    assert_abs_diff_eq!(result.total_investment, 6980.0, epsilon = 1e-9);
    assert_abs_diff_eq!(result.region_values[&Region::American], 2400.0, epsilon = 1e-9);
    assert_abs_diff_eq!(result.region_values[&Region::European], 1980.0, epsilon = 1e-9);
    assert_abs_diff_eq!(result.region_values[&Region::Asian], 1600.0, epsilon = 1e-9);
    assert_abs_diff_eq!(result.region_values[&Region::Other], 1000.0, epsilon = 1e-9);

    let tickers: Vec<_> = result.diagnostics.iter().map(Diagnostic::ticker).collect();
    assert_eq!(tickers, vec!["ODD", "STALE"]);
    assert_eq!(result.skipped().count(), 1);
}

#[test]
fn failing_lookup_degrades_one_holding() {
    let source = FlakySource {
        inner: global_source(),
        broken: "SAP.DE",
    };
    let result =
        compute_diversification(&positions(&[("AAPL", 1.0), ("SAP.DE", 1.0)]), &source).unwrap();

    assert_abs_diff_eq!(result.percentage(Region::American), 100.0, epsilon = 0.01);
    assert!(matches!(
        &result.diagnostics[..],
        [Diagnostic::LookupFailed { ticker, reason }]
            if ticker == "SAP.DE" && reason.contains("500")
    ));

    let resolution = resolve_region("SAP.DE", &source);
    assert_eq!(resolution.region(), Region::Other);
    assert!(resolution.label().contains("SAP.DE"));
}

#[test]
fn form_rows_feed_overview() {
    let source = global_source();
    let rows = [("aapl", 10.0), ("", 3.0), ("shel.l", 40.0), ("BHP.AX", 0.0)];
    let book = valid_positions(rows);

    let overview = build_overview(&book, &source).unwrap();
    assert_eq!(overview.holdings, 2);
    assert_eq!(overview.top_holding.as_deref(), Some("AAPL"));
    assert_eq!(overview.sector_count(), 2);
    assert_abs_diff_eq!(overview.total_value, 1900.0 + 1080.0, epsilon = 1e-9);
}

#[test]
fn ticker_missing_from_snapshot_is_a_failed_lookup() {
    // A skipped quote batch leaves its tickers out of the snapshot
    let result = compute_diversification(
        &positions(&[("AAPL", 1.0), ("MSFT", 5.0)]),
        &global_source(),
    )
    .unwrap();

    assert_abs_diff_eq!(result.percentage(Region::American), 100.0, epsilon = 0.01);
    assert_eq!(result.skipped().count(), 1);
    assert!(matches!(
        &result.diagnostics[..],
        [Diagnostic::LookupFailed { ticker, .. }] if ticker == "MSFT"
    ));
}

#[test]
fn overview_volatility_from_snapshot_history() {
    let source = global_source()
        .with_closes("AAPL", vec![100.0, 110.0, 99.0])
        .with_closes("SHEL.L", vec![10.0, 10.0, 10.0]);
    let book = positions(&[("AAPL", 10.0), ("SHEL.L", 40.0), ("BHP.AX", 1.0)]);

    let overview = build_overview(&book, &source).unwrap();
    // BHP.AX has no history and is left out of the weighting
    let expected = 0.1 * 1900.0 / (1900.0 + 1080.0);
    assert_abs_diff_eq!(overview.volatility.unwrap(), expected, epsilon = 1e-9);
}

use anyhow::{bail, Context};
use clap::Parser;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use portfolio_regions::overview::VOLATILITY_DAYS;
use portfolio_regions::{
    build_overview, compute_diversification, parse_position, DiversificationError, Positions,
    SnapshotSource, SourceConfig, YahooQuoteSource,
};

/// Regional diversification report for a stock portfolio
#[derive(Parser, Debug)]
#[command(name = "portfolio_regions")]
#[command(version, about, long_about = None)]
struct Args {
    /// Positions as TICKER=QUANTITY
    #[arg(required = true)]
    positions: Vec<String>,

    /// Read quotes from a snapshot file instead of fetching them
    #[arg(short, long, conflicts_with = "save_snapshot")]
    snapshot: Option<PathBuf>,

    /// Write the fetched quotes to a snapshot file
    #[arg(long)]
    save_snapshot: Option<PathBuf>,

    /// JSON config for the quote source
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn report<T: serde::Serialize>(result: Result<T, DiversificationError>) -> Value {
    match result {
        Ok(value) => serde_json::to_value(value)
            .unwrap_or_else(|e| json!({ "Error": e.to_string() })),
        Err(e) => json!({ "Error": e.to_string() }),
    }
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut positions = Positions::new();
    for arg in &args.positions {
        let (ticker, quantity) = parse_position(arg)?;
        *positions.entry(ticker).or_insert(0.0) += quantity;
    }
    if positions.values().all(|q| *q <= 0.0) {
        bail!("Add at least one valid stock with a positive quantity");
    }

    let source = match &args.snapshot {
        Some(path) => SnapshotSource::load(path)
            .with_context(|| format!("failed to read snapshot '{}'", path.display()))?,
        None => {
            let config = match &args.config {
                Some(path) => SourceConfig::load(path)
                    .with_context(|| format!("failed to read config '{}'", path.display()))?,
                None => SourceConfig::default(),
            };
            let client = YahooQuoteSource::new(config)?;
            let tickers: Vec<String> = positions.keys().cloned().collect();
            let mut snapshot = client.fetch_snapshot(&tickers);
            client.fill_history(&mut snapshot, &tickers, VOLATILITY_DAYS + 1);
            if let Some(path) = &args.save_snapshot {
                snapshot.save(path)?;
                tracing::info!(path = %path.display(), "saved quote snapshot");
            }
            snapshot
        }
    };

    let output = json!({
        "diversification": report(compute_diversification(&positions, &source)),
        "overview": report(build_overview(&positions, &source)),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

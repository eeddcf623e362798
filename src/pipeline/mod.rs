//! Pipeline orchestrator: ties source → fetchers → CSV storage together.
//!
//! For each configured ticker, in order:
//!   1. Fetch company metadata; keep it if the lookup succeeded.
//!   2. Fetch the daily history over the lookback window; keep it if non-empty.
//!   3. Pause before the next ticker.
//!
//! Per-ticker failures only shrink the output. Once the loop is done each
//! accumulator is written to its own CSV file, or skipped with an error log
//! if it stayed empty. The run itself only fails on output I/O errors.

use crate::config::{GatherConfig, OutputConfig};
use crate::fetch::{fetch_company_info, fetch_historical_prices};
use crate::models::{CompanyRecord, PriceBar};
use crate::source::MarketDataSource;
use crate::storage::{write_company_info, write_stock_prices};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

pub struct Pipeline {
    gather: GatherConfig,
    output: OutputConfig,
    source: Arc<dyn MarketDataSource>,
}

impl Pipeline {
    pub fn new(gather: GatherConfig, output: OutputConfig, source: Arc<dyn MarketDataSource>) -> Self {
        Self { gather, output, source }
    }

    pub async fn run(&self) -> Result<PipelineStats> {
        let tickers = &self.gather.tickers;
        info!(
            "=== Fetching {}y daily history for {} tickers ===",
            self.gather.lookback_years,
            tickers.len()
        );

        let mut companies: Vec<CompanyRecord> = Vec::new();
        let mut prices: Vec<PriceBar> = Vec::new();
        let mut stats = PipelineStats::default();

        for (i, symbol) in tickers.iter().enumerate() {
            info!("Processing Ticker: {}", symbol);

            match fetch_company_info(self.source.as_ref(), symbol).await {
                Some(record) => companies.push(record),
                None => stats.company_failures += 1,
            }

            match fetch_historical_prices(self.source.as_ref(), symbol, self.gather.lookback_years)
                .await
            {
                Some(bars) => {
                    stats.price_tickers_fetched += 1;
                    prices.extend(bars);
                }
                None => stats.price_failures += 1,
            }

            stats.tickers_processed += 1;

            if i + 1 < tickers.len() && !self.gather.pause().is_zero() {
                tokio::time::sleep(self.gather.pause()).await;
            }
        }

        stats.companies_fetched = companies.len();
        stats.price_rows = prices.len();

        // ── Persist ───────────────────────────────────────────────────────────
        if companies.is_empty() {
            error!("Company info fetching failed: no records for any ticker");
        } else {
            let path = write_company_info(&self.output.company_path(), &companies)
                .context("Failed to write company info")?;
            stats.company_file = Some(path);
        }

        if prices.is_empty() {
            error!("Stock price data fetching failed: no rows for any ticker");
        } else {
            let path = write_stock_prices(&self.output.prices_path(), &prices)
                .context("Failed to write stock prices")?;
            stats.prices_file = Some(path);
        }

        info!(
            "=== Done: {} tickers | {} companies | {} price rows from {} tickers | {} + {} failures ===",
            stats.tickers_processed,
            stats.companies_fetched,
            stats.price_rows,
            stats.price_tickers_fetched,
            stats.company_failures,
            stats.price_failures,
        );

        Ok(stats)
    }
}

#[derive(Debug, Default)]
pub struct PipelineStats {
    pub tickers_processed: usize,
    pub companies_fetched: usize,
    pub price_tickers_fetched: usize,
    pub price_rows: usize,
    pub company_failures: usize,
    pub price_failures: usize,
    pub company_file: Option<PathBuf>,
    pub prices_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::mock::{MockSource, profile, raw_bar, ymd};
    use tokio_test::assert_ok;

    fn configs(tickers: &[&str], dir: &std::path::Path) -> (GatherConfig, OutputConfig) {
        let gather = GatherConfig {
            tickers: tickers.iter().map(|s| s.to_string()).collect(),
            lookback_years: 5,
            pause_ms: 0,
        };
        let output = OutputConfig {
            data_dir: dir.to_path_buf(),
            ..OutputConfig::default()
        };
        (gather, output)
    }

    fn two_aapl_bars() -> Vec<crate::models::RawBar> {
        vec![
            raw_bar(ymd(2024, 1, 2), 187.15, 188.44, 183.89, 185.64, 82_488_700),
            raw_bar(ymd(2024, 1, 3), 184.22, 185.88, 183.43, 184.25, 58_414_500),
        ]
    }

    fn read_csv(path: &std::path::Path) -> Vec<csv::StringRecord> {
        csv::Reader::from_path(path)
            .unwrap()
            .records()
            .map(|r| r.unwrap())
            .collect()
    }

    #[tokio::test]
    async fn single_ticker_success_writes_both_files() {
        let tmp = tempfile::tempdir().unwrap();
        let (gather, output) = configs(&["AAPL"], tmp.path());
        let source = MockSource::new()
            .profile("AAPL", profile("Apple Inc.", "Technology", "Consumer Electronics"))
            .history("AAPL", two_aapl_bars());

        let stats = assert_ok!(Pipeline::new(gather, output, Arc::new(source)).run().await);

        let companies = read_csv(&stats.company_file.unwrap());
        assert_eq!(companies.len(), 1);
        assert_eq!(&companies[0][0], "AAPL");

        let prices = read_csv(&stats.prices_file.unwrap());
        assert_eq!(prices.len(), 2);
        assert!(prices.iter().all(|r| &r[1] == "AAPL"));
        assert_eq!(&prices[0][0], "2024-01-02");
    }

    #[tokio::test]
    async fn unknown_ticker_writes_nothing_and_still_succeeds() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("data");
        let (gather, output) = configs(&["XXX"], &out);

        let stats = assert_ok!(
            Pipeline::new(gather, output, Arc::new(MockSource::new())).run().await
        );

        assert_eq!(stats.tickers_processed, 1);
        assert_eq!(stats.company_failures, 1);
        assert_eq!(stats.price_failures, 1);
        assert!(stats.company_file.is_none());
        assert!(stats.prices_file.is_none());
        assert!(!out.join("company_info.csv").exists());
        assert!(!out.join("stock_prices.csv").exists());
    }

    #[tokio::test]
    async fn one_price_failure_does_not_stop_the_run() {
        let tmp = tempfile::tempdir().unwrap();
        let (gather, output) = configs(&["AAPL", "MSFT"], tmp.path());
        let source = MockSource::new()
            .profile("AAPL", profile("Apple Inc.", "Technology", "Consumer Electronics"))
            .history("AAPL", two_aapl_bars())
            .profile("MSFT", profile("Microsoft Corporation", "Technology", "Software - Infrastructure"))
            .history_fails("MSFT", "connection reset by peer");

        let stats = Pipeline::new(gather, output, Arc::new(source)).run().await.unwrap();

        let companies = read_csv(&stats.company_file.unwrap());
        let tickers: Vec<&str> = companies.iter().map(|r| &r[0]).collect();
        assert_eq!(tickers, vec!["AAPL", "MSFT"]);

        let prices = read_csv(&stats.prices_file.unwrap());
        assert_eq!(prices.len(), 2);
        assert!(prices.iter().all(|r| &r[1] == "AAPL"));
    }

    #[tokio::test]
    async fn every_ticker_is_tried_exactly_once_per_fetcher() {
        let tmp = tempfile::tempdir().unwrap();
        let (gather, output) = configs(&["XXX", "AAPL", "YYY"], tmp.path());
        let source = Arc::new(
            MockSource::new()
                .profile_fails("XXX", "boom")
                .history_fails("XXX", "boom")
                .history("AAPL", two_aapl_bars()),
        );

        Pipeline::new(gather, output, source.clone()).run().await.unwrap();

        let calls = source.calls();
        let expected: Vec<(&str, String)> = ["XXX", "AAPL", "YYY"]
            .iter()
            .flat_map(|s| [("profile", s.to_string()), ("history", s.to_string())])
            .collect();
        assert_eq!(calls, expected);
    }

    #[tokio::test]
    async fn prices_only_run_skips_company_file() {
        let tmp = tempfile::tempdir().unwrap();
        let (gather, output) = configs(&["AAPL"], tmp.path());
        let source = MockSource::new().history("AAPL", two_aapl_bars());

        let stats = Pipeline::new(gather, output, Arc::new(source)).run().await.unwrap();

        assert!(stats.company_file.is_none());
        assert!(!tmp.path().join("company_info.csv").exists());
        assert_eq!(stats.price_rows, 2);
        assert!(tmp.path().join("stock_prices.csv").exists());
    }

    #[tokio::test]
    async fn price_rows_follow_ticker_order() {
        let tmp = tempfile::tempdir().unwrap();
        let (gather, output) = configs(&["MSFT", "AAPL"], tmp.path());
        let source = MockSource::new()
            .history("AAPL", two_aapl_bars())
            .history("MSFT", vec![raw_bar(ymd(2024, 1, 2), 373.86, 375.9, 366.77, 370.87, 25_258_600)]);

        let stats = Pipeline::new(gather, output, Arc::new(source)).run().await.unwrap();

        let prices = read_csv(&stats.prices_file.unwrap());
        let tickers: Vec<&str> = prices.iter().map(|r| &r[1]).collect();
        assert_eq!(tickers, vec!["MSFT", "AAPL", "AAPL"]);
    }

    #[tokio::test(start_paused = true)]
    async fn pauses_between_tickers_but_not_after_the_last() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut gather, output) = configs(&["AAPL", "MSFT", "KO"], tmp.path());
        gather.pause_ms = 1000;
        let source = Arc::new(MockSource::new().history("AAPL", two_aapl_bars()));

        let started = tokio::time::Instant::now();
        let stats = Pipeline::new(gather, output, source.clone()).run().await.unwrap();

        assert_eq!(stats.tickers_processed, 3);
        assert_eq!(started.elapsed(), std::time::Duration::from_secs(2));
        assert_eq!(source.calls().len(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn single_ticker_run_never_sleeps() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut gather, output) = configs(&["AAPL"], tmp.path());
        gather.pause_ms = 1000;
        let source = MockSource::new().history("AAPL", two_aapl_bars());

        let started = tokio::time::Instant::now();
        Pipeline::new(gather, output, Arc::new(source)).run().await.unwrap();

        assert_eq!(started.elapsed(), std::time::Duration::ZERO);
    }
}

//! Yahoo Finance JSON payloads and their conversion into provider-side records.

use crate::models::{CompanyProfile, RawBar};
use crate::source::SourceError;
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::Deserialize;
use std::collections::HashMap;

// ── Shared ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
}

impl From<ApiError> for SourceError {
    fn from(e: ApiError) -> Self {
        SourceError::Api {
            code: e.code,
            description: e.description,
        }
    }
}

// ── /v8/finance/chart ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ChartEnvelope {
    pub chart: ChartBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartBody {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResult {
    #[serde(default)]
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Option<Vec<i64>>,
    #[serde(default)]
    pub indicators: Indicators,
    #[serde(default)]
    pub events: Option<ChartEvents>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartMeta {
    /// Exchange offset from UTC, in seconds.
    #[serde(default)]
    pub gmtoffset: Option<i32>,
    #[serde(rename = "exchangeTimezoneName", default)]
    pub exchange_timezone_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteColumns>,
    #[serde(default)]
    pub adjclose: Vec<AdjCloseColumn>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuoteColumns {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<i64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdjCloseColumn {
    #[serde(default)]
    pub adjclose: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartEvents {
    #[serde(default)]
    pub dividends: HashMap<String, DividendEvent>,
    #[serde(default)]
    pub splits: HashMap<String, SplitEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DividendEvent {
    pub amount: f64,
    pub date: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SplitEvent {
    pub date: i64,
    pub numerator: f64,
    pub denominator: f64,
}

impl ChartEnvelope {
    /// Flatten the column arrays into one `RawBar` per timestamp.
    /// A result without timestamps is an empty history, not an error.
    pub fn into_raw_bars(self) -> Result<Vec<RawBar>, SourceError> {
        if let Some(err) = self.chart.error {
            return Err(err.into());
        }
        let Some(result) = self.chart.result.and_then(|r| r.into_iter().next()) else {
            return Ok(Vec::new());
        };

        let offset = result
            .meta
            .gmtoffset
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());

        let timestamps = result.timestamp.unwrap_or_default();
        let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
        let adj = result
            .indicators
            .adjclose
            .into_iter()
            .next()
            .unwrap_or_default();

        let events = result.events.unwrap_or_default();
        let mut dividends: HashMap<NaiveDate, f64> = HashMap::new();
        for ev in events.dividends.into_values() {
            *dividends.entry(local_date(ev.date, offset)?).or_default() += ev.amount;
        }
        let mut splits: HashMap<NaiveDate, f64> = HashMap::new();
        for ev in events.splits.into_values() {
            if ev.denominator != 0.0 {
                splits.insert(local_date(ev.date, offset)?, ev.numerator / ev.denominator);
            }
        }

        let at = |col: &Vec<Option<f64>>, i: usize| col.get(i).copied().flatten();

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let timestamp = to_local(ts, offset)?;
            let date = timestamp.date_naive();
            bars.push(RawBar {
                timestamp,
                open: at(&quote.open, i),
                high: at(&quote.high, i),
                low: at(&quote.low, i),
                close: at(&quote.close, i),
                adj_close: at(&adj.adjclose, i),
                volume: quote.volume.get(i).copied().flatten(),
                dividends: dividends.get(&date).copied().unwrap_or(0.0),
                stock_splits: splits.get(&date).copied().unwrap_or(0.0),
            });
        }
        Ok(bars)
    }
}

fn to_local(ts: i64, offset: FixedOffset) -> Result<DateTime<FixedOffset>, SourceError> {
    DateTime::from_timestamp(ts, 0)
        .map(|utc| utc.with_timezone(&offset))
        .ok_or_else(|| SourceError::Malformed(format!("timestamp {} out of range", ts)))
}

fn local_date(ts: i64, offset: FixedOffset) -> Result<NaiveDate, SourceError> {
    to_local(ts, offset).map(|dt| dt.date_naive())
}

// ── /v10/finance/quoteSummary ─────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteSummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    pub quote_summary: QuoteSummaryBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteSummaryBody {
    #[serde(default)]
    pub result: Option<Vec<QuoteSummaryResult>>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuoteSummaryResult {
    #[serde(rename = "assetProfile", default)]
    pub asset_profile: Option<AssetProfile>,
    #[serde(rename = "quoteType", default)]
    pub quote_type: Option<QuoteTypeModule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetProfile {
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuoteTypeModule {
    #[serde(rename = "longName", default)]
    pub long_name: Option<String>,
}

impl QuoteSummaryEnvelope {
    pub fn into_profile(self) -> Result<CompanyProfile, SourceError> {
        if let Some(err) = self.quote_summary.error {
            return Err(err.into());
        }
        let result = self
            .quote_summary
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| SourceError::Malformed("quoteSummary carried no result".to_string()))?;

        let profile = result.asset_profile.unwrap_or_default();
        Ok(CompanyProfile {
            long_name: result
                .quote_type
                .and_then(|q| q.long_name)
                .filter(|s| !s.is_empty()),
            sector: profile.sector.filter(|s| !s.is_empty()),
            industry: profile.industry.filter(|s| !s.is_empty()),
        })
    }
}

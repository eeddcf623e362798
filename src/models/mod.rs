use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

// ── Company metadata ──────────────────────────────────────────────────────────

/// One row of `company_info.csv`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompanyRecord {
    pub ticker: String,
    pub company_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
}

// ── Daily price bar ───────────────────────────────────────────────────────────

/// One row of `stock_prices.csv`. Field order is the column order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceBar {
    pub trade_date: NaiveDate,
    pub ticker: String,
    pub open_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub close_price: f64,
    pub volume: i64,
}

#[cfg(test)]
impl PriceBar {
    pub const COLUMNS: [&'static str; 7] = [
        "trade_date",
        "ticker",
        "open_price",
        "high_price",
        "low_price",
        "close_price",
        "volume",
    ];
}

// ── Provider-side raw records ─────────────────────────────────────────────────

/// Descriptive fields as the provider returned them, any of which may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyProfile {
    pub long_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
}

/// A daily bar as delivered by the provider, before projection onto `PriceBar`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBar {
    /// Bar timestamp in the exchange's local offset
    pub timestamp: DateTime<FixedOffset>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub adj_close: Option<f64>,
    pub volume: Option<i64>,
    pub dividends: f64,
    pub stock_splits: f64,
}

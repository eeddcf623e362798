//! Scripted in-memory source for pipeline and fetcher tests.

use crate::models::{CompanyProfile, RawBar};
use crate::source::{MarketDataSource, SourceError};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Clone)]
pub enum Scripted<T> {
    Ok(T),
    Fail(String),
}

#[derive(Default)]
pub struct MockSource {
    profiles: HashMap<String, Scripted<CompanyProfile>>,
    histories: HashMap<String, Scripted<Vec<RawBar>>>,
    calls: Mutex<Vec<(&'static str, String)>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn profile(mut self, symbol: &str, profile: CompanyProfile) -> Self {
        self.profiles.insert(symbol.to_string(), Scripted::Ok(profile));
        self
    }

    pub fn profile_fails(mut self, symbol: &str, msg: &str) -> Self {
        self.profiles.insert(symbol.to_string(), Scripted::Fail(msg.to_string()));
        self
    }

    pub fn history(mut self, symbol: &str, bars: Vec<RawBar>) -> Self {
        self.histories.insert(symbol.to_string(), Scripted::Ok(bars));
        self
    }

    pub fn history_fails(mut self, symbol: &str, msg: &str) -> Self {
        self.histories.insert(symbol.to_string(), Scripted::Fail(msg.to_string()));
        self
    }

    /// Every call made so far, as (operation, symbol).
    pub fn calls(&self) -> Vec<(&'static str, String)> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, op: &'static str, symbol: &str) {
        self.calls.lock().unwrap().push((op, symbol.to_string()));
    }
}

fn not_found(symbol: &str) -> SourceError {
    SourceError::Api {
        code: "Not Found".to_string(),
        description: format!("Quote not found for symbol: {}", symbol),
    }
}

#[async_trait]
impl MarketDataSource for MockSource {
    async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile, SourceError> {
        self.record("profile", symbol);
        match self.profiles.get(symbol) {
            Some(Scripted::Ok(p)) => Ok(p.clone()),
            Some(Scripted::Fail(msg)) => Err(SourceError::Malformed(msg.clone())),
            None => Err(not_found(symbol)),
        }
    }

    async fn daily_history(
        &self,
        symbol: &str,
        _lookback_years: u32,
    ) -> Result<Vec<RawBar>, SourceError> {
        self.record("history", symbol);
        match self.histories.get(symbol) {
            Some(Scripted::Ok(bars)) => Ok(bars.clone()),
            Some(Scripted::Fail(msg)) => Err(SourceError::Malformed(msg.clone())),
            None => Err(not_found(symbol)),
        }
    }
}

/// A complete raw bar stamped 09:30 New York time on `date`.
pub fn raw_bar(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: i64) -> RawBar {
    let offset = FixedOffset::west_opt(5 * 3600).unwrap();
    let timestamp: DateTime<FixedOffset> = date
        .and_hms_opt(9, 30, 0)
        .unwrap()
        .and_local_timezone(offset)
        .unwrap();
    RawBar {
        timestamp,
        open: Some(open),
        high: Some(high),
        low: Some(low),
        close: Some(close),
        adj_close: Some(close * 0.99),
        volume: Some(volume),
        dividends: 0.0,
        stock_splits: 0.0,
    }
}

pub fn profile(name: &str, sector: &str, industry: &str) -> CompanyProfile {
    CompanyProfile {
        long_name: Some(name.to_string()),
        sector: Some(sector.to_string()),
        industry: Some(industry.to_string()),
    }
}

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

use crate::models::{CompanyProfile, CompanyRecord, PriceBar, RawBar};
use chrono::{DateTime, FixedOffset, NaiveDate};
use tracing::debug;

// ── Normalisers ───────────────────────────────────────────────────────────────

/// Round to 3 decimals: scale, round half to even, unscale.
/// 0.0625 → 0.062 | 0.1875 → 0.188 | 187.15 → 187.15
pub fn round_price(v: f64) -> f64 {
    (v * 1000.0).round_ties_even() / 1000.0
}

/// Calendar date of a bar in the exchange's own offset.
pub fn normalize_trade_date(ts: &DateTime<FixedOffset>) -> NaiveDate {
    ts.date_naive()
}

// ── Provider record → schema row ──────────────────────────────────────────────

pub fn profile_to_record(symbol: &str, profile: CompanyProfile) -> CompanyRecord {
    CompanyRecord {
        ticker: symbol.to_string(),
        company_name: profile.long_name,
        sector: profile.sector,
        industry: profile.industry,
    }
}

/// Project one raw bar onto the seven output columns. Adjusted close,
/// dividends and splits are dropped. Rows missing any price are skipped.
pub fn raw_bar_to_price_bar(symbol: &str, raw: &RawBar) -> Option<PriceBar> {
    let (Some(open), Some(high), Some(low), Some(close)) = (raw.open, raw.high, raw.low, raw.close)
    else {
        debug!("{}: skipping incomplete bar at {}", symbol, raw.timestamp);
        return None;
    };

    if raw.dividends != 0.0 || raw.stock_splits != 0.0 {
        debug!(
            "{}: corporate action at {} (dividend {}, split {}, adj close {:?})",
            symbol, raw.timestamp, raw.dividends, raw.stock_splits, raw.adj_close
        );
    }

    Some(PriceBar {
        trade_date: normalize_trade_date(&raw.timestamp),
        ticker: symbol.to_string(),
        open_price: round_price(open),
        high_price: round_price(high),
        low_price: round_price(low),
        close_price: round_price(close),
        volume: raw.volume.unwrap_or(0),
    })
}

/// Reshape a provider history into schema rows, ascending by trade date.
pub fn reshape_history(symbol: &str, raw: &[RawBar]) -> Vec<PriceBar> {
    let mut bars: Vec<PriceBar> = raw
        .iter()
        .filter_map(|r| raw_bar_to_price_bar(symbol, r))
        .collect();
    bars.sort_by_key(|b| b.trade_date);
    bars
}

// ── Tests ─────────────────────────────────────────────────────────────────────

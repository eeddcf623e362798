//! Per-ticker fetchers. Each one isolates its own failures: a provider error or
//! an empty history is logged and turned into `None`, never propagated.

pub mod cleaner;

use crate::models::{CompanyRecord, PriceBar};
use crate::source::MarketDataSource;
use tracing::{error, info, warn};

use self::cleaner::{profile_to_record, reshape_history};

/// Descriptive metadata for one ticker, or `None` if the lookup failed.
pub async fn fetch_company_info(
    source: &dyn MarketDataSource,
    symbol: &str,
) -> Option<CompanyRecord> {
    match source.company_profile(symbol).await {
        Ok(profile) => {
            info!("Company information of {} fetched", symbol);
            Some(profile_to_record(symbol, profile))
        }
        Err(e) => {
            warn!("Company info fetch failed for {}: {}", symbol, e);
            None
        }
    }
}

/// Daily bars over the lookback window, or `None` on error or empty history.
pub async fn fetch_historical_prices(
    source: &dyn MarketDataSource,
    symbol: &str,
    lookback_years: u32,
) -> Option<Vec<PriceBar>> {
    let raw = match source.daily_history(symbol, lookback_years).await {
        Ok(raw) => raw,
        Err(e) => {
            error!("Error while fetching historical data for {}: {}", symbol, e);
            return None;
        }
    };

    if raw.is_empty() {
        warn!("No historical data found for {}", symbol);
        return None;
    }

    let bars = reshape_history(symbol, &raw);
    if bars.is_empty() {
        warn!("No complete price bars for {} ({} raw rows)", symbol, raw.len());
        return None;
    }

    info!(
        "{}: {} bars ({} → {})",
        symbol,
        bars.len(),
        bars[0].trade_date,
        bars[bars.len() - 1].trade_date
    );
    Some(bars)
}

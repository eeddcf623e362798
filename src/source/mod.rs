pub mod http_client;
pub mod wire;

#[cfg(test)]
pub mod mock;

use crate::config::ProviderConfig;
use crate::models::{CompanyProfile, RawBar};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use self::http_client::{HttpClient, HttpResponse};
use self::wire::{ChartEnvelope, QuoteSummaryEnvelope};

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("provider error ({code}): {description}")]
    Api { code: String, description: String },

    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("session setup failed: {0}")]
    Auth(String),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

// ── Source trait ──────────────────────────────────────────────────────────────

/// Swappable market-data provider.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile, SourceError>;
    async fn daily_history(&self, symbol: &str, lookback_years: u32)
        -> Result<Vec<RawBar>, SourceError>;
}

// ── Yahoo Finance ─────────────────────────────────────────────────────────────

pub struct YahooSource {
    client: HttpClient,
    base_url: Url,
}

impl YahooSource {
    pub fn new(config: &ProviderConfig) -> Result<Self, SourceError> {
        let base_url = Url::parse(&config.base_url)?;
        let crumb_url = endpoint(&base_url, &["v1", "test", "getcrumb"])?;
        Ok(Self {
            client: HttpClient::new(config, crumb_url)?,
            base_url,
        })
    }

    /// e.g. AAPL, 5 → /v8/finance/chart/AAPL?range=5y&interval=1d&...
    fn chart_url(&self, symbol: &str, lookback_years: u32) -> Result<Url, SourceError> {
        let mut url = endpoint(&self.base_url, &["v8", "finance", "chart", symbol])?;
        url.query_pairs_mut()
            .append_pair("range", &format!("{}y", lookback_years))
            .append_pair("interval", "1d")
            .append_pair("events", "div,splits")
            .append_pair("includePrePost", "false");
        Ok(url)
    }

    fn quote_summary_url(&self, symbol: &str, crumb: &str) -> Result<Url, SourceError> {
        let mut url = endpoint(&self.base_url, &["v10", "finance", "quoteSummary", symbol])?;
        url.query_pairs_mut()
            .append_pair("modules", "assetProfile,quoteType")
            .append_pair("crumb", crumb);
        Ok(url)
    }
}

#[async_trait]
impl MarketDataSource for YahooSource {
    async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile, SourceError> {
        let mut resp = self.fetch_summary(symbol).await?;

        // A stale crumb is rejected with 401; pick up a new session once
        if resp.status == 401 {
            warn!("{}: crumb rejected, refreshing session", symbol);
            self.client.invalidate_crumb();
            resp = self.fetch_summary(symbol).await?;
            if resp.status == 401 {
                return Err(SourceError::Http {
                    status: resp.status,
                    url: resp.url.to_string(),
                });
            }
        }

        decode_json::<QuoteSummaryEnvelope>(&resp)?.into_profile()
    }

    async fn daily_history(
        &self,
        symbol: &str,
        lookback_years: u32,
    ) -> Result<Vec<RawBar>, SourceError> {
        let resp = self.client.get(self.chart_url(symbol, lookback_years)?).await?;
        let envelope: ChartEnvelope = decode_json(&resp)?;

        if let Some(tz) = envelope
            .chart
            .result
            .as_ref()
            .and_then(|r| r.first())
            .and_then(|r| r.meta.exchange_timezone_name.as_deref())
        {
            debug!("{}: exchange timezone {}", symbol, tz);
        }

        envelope.into_raw_bars()
    }
}

impl YahooSource {
    async fn fetch_summary(&self, symbol: &str) -> Result<HttpResponse, SourceError> {
        let crumb = self.client.crumb().await?;
        self.client.get(self.quote_summary_url(symbol, &crumb)?).await
    }
}

fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, SourceError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| SourceError::Malformed(format!("{} cannot be a base URL", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Error payloads are JSON too, so the body is decoded before the status is
/// judged. A non-2xx answer that does not decode is reported by status.
fn decode_json<T: DeserializeOwned>(resp: &HttpResponse) -> Result<T, SourceError> {
    match serde_json::from_str(&resp.body) {
        Ok(value) => Ok(value),
        Err(_) if !resp.is_success() => Err(SourceError::Http {
            status: resp.status,
            url: resp.url.to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

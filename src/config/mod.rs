use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Dow Jones Industrial Average constituents gathered by default.
pub const DOW_30: [&str; 30] = [
    "AXP", "AMGN", "AAPL", "BA", "CAT", "CSCO", "CVX", "GS", "HD", "HON",
    "IBM", "INTC", "JNJ", "KO", "JPM", "MCD", "MMM", "MRK", "MSFT", "NKE",
    "PG", "TRV", "UNH", "CRM", "VZ", "V", "WBA", "WMT", "DIS", "DOW",
];

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub gather: GatherConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Market-data provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Visited once per session to pick up the consent cookie.
    #[serde(default = "default_cookie_url")]
    pub cookie_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// What to gather and how fast
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatherConfig {
    #[serde(default = "default_tickers")]
    pub tickers: Vec<String>,

    #[serde(default = "default_lookback_years")]
    pub lookback_years: u32,

    /// Fixed pause between consecutive tickers.
    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,
}

/// Where the CSV files land
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_company_file")]
    pub company_file: String,

    #[serde(default = "default_prices_file")]
    pub prices_file: String,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_base_url() -> String {
    "https://query1.finance.yahoo.com".to_string()
}
fn default_cookie_url() -> String {
    "https://fc.yahoo.com".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
        .to_string()
}
fn default_tickers() -> Vec<String> {
    DOW_30.iter().map(|s| s.to_string()).collect()
}
fn default_lookback_years() -> u32 {
    5
}
fn default_pause_ms() -> u64 {
    1000
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_company_file() -> String {
    "company_info.csv".to_string()
}
fn default_prices_file() -> String {
    "stock_prices.csv".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            cookie_url: default_cookie_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for GatherConfig {
    fn default() -> Self {
        Self {
            tickers: default_tickers(),
            lookback_years: default_lookback_years(),
            pause_ms: default_pause_ms(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            company_file: default_company_file(),
            prices_file: default_prices_file(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            gather: GatherConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl GatherConfig {
    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

impl OutputConfig {
    pub fn company_path(&self) -> PathBuf {
        self.data_dir.join(&self.company_file)
    }

    pub fn prices_path(&self) -> PathBuf {
        self.data_dir.join(&self.prices_file)
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::Environment::with_prefix("DJI")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("gather.tickers")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to assemble configuration sources")?;

        let app_cfg: AppConfig = cfg
            .try_deserialize()
            .context("Invalid configuration")?;
        app_cfg.validate()?;
        Ok(app_cfg)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.gather.lookback_years >= 1,
            "gather.lookback_years must be at least 1 (got {})",
            self.gather.lookback_years
        );
        ensure!(
            !self.output.company_file.is_empty() && !self.output.prices_file.is_empty(),
            "output file names must not be empty"
        );
        Ok(())
    }
}

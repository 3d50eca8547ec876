//! Configuration types for bracket-desk
//!
//! Every section has defaults, so a partial (or missing) file still yields a
//! usable configuration. Values are handed to the core by value; nothing here
//! is shared mutable state.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub quote: QuoteConfig,
    #[serde(default)]
    pub panel: PanelConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Gateway connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub client_id: i32,
    pub connect_timeout_secs: u64,
    /// Currency the account balances are read in
    pub currency: String,
}

impl BrokerConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4001,
            client_id: 1,
            connect_timeout_secs: 10,
            currency: "USD".to_string(),
        }
    }
}

/// Risk sizing settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Percent of equity risked per trade
    pub risk_percent: Decimal,
    /// Quick-select risk percentages offered by the panel
    pub risk_buttons: Vec<Decimal>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            risk_percent: dec!(1.0),
            risk_buttons: vec![dec!(0.25), dec!(0.5), dec!(1.5)],
        }
    }
}

/// Order execution pacing and fill-wait bounds
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Interval between primary order status polls
    pub fill_poll_interval_ms: u64,
    /// Maximum number of status polls before giving up
    pub max_fill_polls: u32,
    /// Wall-clock ceiling on the whole fill wait
    pub fill_timeout_secs: u64,
    /// Delay after each protective leg placement
    pub leg_pacing_ms: u64,
    /// Delay between the two legs of an OCO pair
    pub oco_pacing_ms: u64,
    /// Cancel a primary that is still working when the fill wait times out
    pub cancel_on_timeout: bool,
}

impl ExecutionConfig {
    pub fn fill_poll_interval(&self) -> Duration {
        Duration::from_millis(self.fill_poll_interval_ms)
    }

    pub fn fill_timeout(&self) -> Duration {
        Duration::from_secs(self.fill_timeout_secs)
    }

    pub fn leg_pacing(&self) -> Duration {
        Duration::from_millis(self.leg_pacing_ms)
    }

    pub fn oco_pacing(&self) -> Duration {
        Duration::from_millis(self.oco_pacing_ms)
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            fill_poll_interval_ms: 1000,
            max_fill_polls: 60,
            fill_timeout_secs: 90,
            leg_pacing_ms: 500,
            oco_pacing_ms: 200,
            cancel_on_timeout: true,
        }
    }
}

/// Market data polling bounds
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QuoteConfig {
    /// Wait after subscribing before the first poll
    pub settle_ms: u64,
    pub poll_interval_ms: u64,
    pub max_polls: u32,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            settle_ms: 1000,
            poll_interval_ms: 500,
            max_polls: 10,
        }
    }
}

/// Plain values consumed by the panel front end
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PanelConfig {
    pub watchlist: Vec<String>,
    pub hotkey_refresh: String,
    pub hotkey_place_order: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            watchlist: ["AAPL", "TSLA", "NVDA", "MSFT", "GOOGL", "AMZN", "META", "SPY", "QQQ", "IWM"]
                .into_iter()
                .map(String::from)
                .collect(),
            hotkey_refresh: "F5".to_string(),
            hotkey_place_order: "F9".to_string(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
    /// Serve Prometheus metrics on this port when set
    pub metrics_port: Option<u16>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_port: None,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format
    #[default]
    Pretty,
    /// JSON format for log aggregation
    Json,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

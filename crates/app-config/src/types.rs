// In crates/app-config/src/types.rs

use core_types::{OrderType, Symbol, TradeSignal};
use risk::{PositionSizing, SimpleRiskSettings};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use crate::{Error, Result};

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// Settings for the exchange REST API.
    pub exchange: ExchangeSettings,
    /// Settings for the prediction service.
    pub ml_api: MlApiSettings,
    /// Trading rules, sizing, risk limits and order management.
    #[serde(default)]
    pub strategy: StrategySettings,
}

impl Settings {
    /// Checks the values serde cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        if self.ml_api.endpoint.trim().is_empty() {
            return Err(Error::Invalid("ml_api.endpoint must not be empty".into()));
        }
        if self.ml_api.symbol.trim().is_empty() {
            return Err(Error::Invalid("ml_api.symbol must not be empty".into()));
        }
        if self.ml_api.poll_interval_seconds == 0 {
            return Err(Error::Invalid("ml_api.poll_interval_seconds must be positive".into()));
        }
        if self.strategy.order_management.monitor_open_orders_every_sec == 0 {
            return Err(Error::Invalid(
                "strategy.order_management.monitor_open_orders_every_sec must be positive".into(),
            ));
        }
        let slippage = self.strategy.limit_price_slippage;
        if !(0.0..1.0).contains(&slippage) {
            return Err(Error::Invalid(format!(
                "strategy.limit_price_slippage must be in [0, 1), got {}",
                slippage
            )));
        }
        if !self.strategy.dry_run
            && (self.exchange.api_key.is_empty() || self.exchange.secret_key.is_empty())
        {
            return Err(Error::Invalid(
                "exchange credentials are required when dry_run is disabled".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Deserialize, Clone)]
pub struct ExchangeSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub passphrase: String,
    /// The REST API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Routes requests to the exchange's demo trading environment.
    #[serde(default)]
    pub simulated_trading: bool,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Trade mode sent with every order ("cash" for spot).
    #[serde(default = "default_td_mode")]
    pub td_mode: String,
}

impl fmt::Debug for ExchangeSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeSettings")
            .field("api_key", &"[REDACTED]")
            .field("secret_key", &"[REDACTED]")
            .field("passphrase", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("simulated_trading", &self.simulated_trading)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("td_mode", &self.td_mode)
            .finish()
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct MlApiSettings {
    pub endpoint: String,
    #[serde(default = "default_ml_api_key", alias = "api-key")]
    pub api_key: String,
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl MlApiSettings {
    pub fn symbol(&self) -> Symbol {
        Symbol::new(self.symbol.clone())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct StrategySettings {
    /// Simulate orders locally instead of sending them to the exchange.
    pub dry_run: bool,
    pub log_level: String,
    pub signal_whitelist: Vec<TradeSignal>,
    pub min_confidence: f64,
    pub min_profit_after_fee: f64,
    pub use_expected_price: bool,
    pub limit_price_slippage: f64,
    pub position_size: PositionSizeSettings,
    pub risk: RiskLimitSettings,
    pub order_type: OrderType,
    pub order_management: OrderManagementSettings,
    pub exit: ExitSettings,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            dry_run: true,
            log_level: "info".to_string(),
            signal_whitelist: vec![TradeSignal::Buy, TradeSignal::Sell],
            min_confidence: 0.6,
            min_profit_after_fee: 0.0,
            use_expected_price: true,
            limit_price_slippage: 0.001,
            position_size: PositionSizeSettings::default(),
            risk: RiskLimitSettings::default(),
            order_type: OrderType::Limit,
            order_management: OrderManagementSettings::default(),
            exit: ExitSettings::default(),
        }
    }
}

impl StrategySettings {
    /// Assembles the settings consumed by the risk manager.
    pub fn risk_settings(&self) -> SimpleRiskSettings {
        let position_sizing = match self.position_size.mode {
            SizingMode::Percent => PositionSizing::Percent {
                percent_of_balance: self.position_size.percent_of_balance,
                max_exposure_usd: self.risk.max_exposure_usd,
            },
            SizingMode::Fixed => PositionSizing::Fixed {
                fixed_size: self.position_size.fixed_size,
            },
        };

        SimpleRiskSettings {
            signal_whitelist: self.signal_whitelist.clone(),
            min_confidence: self.min_confidence,
            min_profit_after_fee: self.min_profit_after_fee,
            use_expected_price: self.use_expected_price,
            limit_price_slippage: self.limit_price_slippage,
            position_sizing,
            max_open_positions: self.risk.max_open_positions,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SizingMode {
    #[default]
    Percent,
    Fixed,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PositionSizeSettings {
    pub mode: SizingMode,
    pub percent_of_balance: f64,
    pub fixed_size: f64,
}

impl Default for PositionSizeSettings {
    fn default() -> Self {
        Self {
            mode: SizingMode::Percent,
            percent_of_balance: 0.01,
            fixed_size: 0.0,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct RiskLimitSettings {
    pub max_exposure_usd: f64,
    pub max_open_positions: usize,
}

impl Default for RiskLimitSettings {
    fn default() -> Self {
        Self {
            max_exposure_usd: 1e9,
            max_open_positions: 10,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct OrderManagementSettings {
    pub cancel_if_unfilled_after_sec: u64,
    pub monitor_open_orders_every_sec: u64,
}

impl Default for OrderManagementSettings {
    fn default() -> Self {
        Self {
            cancel_if_unfilled_after_sec: 120,
            monitor_open_orders_every_sec: 15,
        }
    }
}

impl OrderManagementSettings {
    pub fn cancel_after(&self) -> Duration {
        Duration::from_secs(self.cancel_if_unfilled_after_sec)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.monitor_open_orders_every_sec)
    }
}

/// Take-profit / stop-loss targets. Accepted but not monitored.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ExitSettings {
    #[serde(default)]
    pub take_profit_pct: Option<f64>,
    #[serde(default)]
    pub stop_loss_pct: Option<f64>,
}

impl ExitSettings {
    pub fn is_configured(&self) -> bool {
        self.take_profit_pct.is_some_and(|tp| tp > 0.0) || self.stop_loss_pct.is_some_and(|sl| sl > 0.0)
    }
}

/// Helper functions for serde defaults
fn default_base_url() -> String { "https://www.okx.com".to_string() }
fn default_td_mode() -> String { "cash".to_string() }
fn default_timeout_secs() -> u64 { 10 }
fn default_ml_api_key() -> String { "my-api-key".to_string() }
fn default_symbol() -> String { "BTC-USDT".to_string() }
fn default_poll_interval() -> u64 { 10 }

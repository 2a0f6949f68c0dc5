// In crates/app-config/src/lib.rs

use config::{Config, Environment, File};
use std::path::Path;

pub mod error;
pub mod types;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use types::{
    ExchangeSettings, ExitSettings, MlApiSettings, OrderManagementSettings, Settings, StrategySettings,
};

/// Loads the application settings starting from a specific base file.
///
/// This function orchestrates the layered configuration loading:
/// 1. Reads the base configuration file (extension optional).
/// 2. Merges an environment-specific file from the same directory
///    (e.g., `development.toml`), if present.
/// 3. Merges settings from environment variables (e.g., `APP_EXCHANGE__API_KEY=...`).
///    The prefix is joined with a single `_`; nested keys are separated by `__`.
pub fn load_settings_from(base: impl AsRef<Path>) -> Result<Settings> {
    let base = base.as_ref();
    // Get the current environment. Default to "development" if not set.
    let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());
    let overlay = base.with_file_name(&environment);

    let settings = Config::builder()
        .add_source(File::from(base))
        .add_source(File::from(overlay).required(false))
        .add_source(Environment::with_prefix("APP").prefix_separator("_").separator("__"))
        .build()?;

    // Deserialize the configuration into our `Settings` struct.
    let settings: Settings = settings.try_deserialize()?;
    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SizingMode;
    use core_types::{OrderType, TradeSignal};
    use risk::PositionSizing;
    use std::io::Write;

    fn write_config(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("base.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn minimal_file_gets_strategy_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
            [exchange]
            api_key = "k"
            secret_key = "s"
            passphrase = "p"

            [ml_api]
            endpoint = "http://localhost:8000/predict"
            "#,
        );

        let settings = load_settings_from(&path).unwrap();
        let strategy = &settings.strategy;
        assert!(strategy.dry_run);
        assert_eq!(strategy.signal_whitelist, vec![TradeSignal::Buy, TradeSignal::Sell]);
        assert_eq!(strategy.min_confidence, 0.6);
        assert_eq!(strategy.limit_price_slippage, 0.001);
        assert_eq!(strategy.order_type, OrderType::Limit);
        assert_eq!(strategy.risk.max_open_positions, 10);
        assert_eq!(strategy.order_management.cancel_if_unfilled_after_sec, 120);
        assert_eq!(strategy.order_management.monitor_open_orders_every_sec, 15);
        assert_eq!(settings.ml_api.symbol, "BTC-USDT");
        assert_eq!(settings.ml_api.poll_interval_seconds, 10);
        assert_eq!(settings.exchange.base_url, "https://www.okx.com");
        assert!(!strategy.exit.is_configured());
    }

    #[test]
    fn full_strategy_block_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
            [exchange]
            api_key = "k"
            secret_key = "s"
            passphrase = "p"
            simulated_trading = true

            [ml_api]
            endpoint = "http://ml/predict"
            api-key = "secret"
            symbol = "ETH-USDT"
            poll_interval_seconds = 5

            [strategy]
            dry_run = false
            signal_whitelist = ["buy"]
            min_confidence = 0.7
            order_type = "market"

            [strategy.position_size]
            mode = "fixed"
            fixed_size = 0.5

            [strategy.risk]
            max_open_positions = 2

            [strategy.exit]
            take_profit_pct = 0.02
            "#,
        );

        let settings = load_settings_from(&path).unwrap();
        assert_eq!(settings.ml_api.api_key, "secret");
        assert!(settings.exchange.simulated_trading);
        assert!(!settings.strategy.dry_run);
        assert_eq!(settings.strategy.position_size.mode, SizingMode::Fixed);
        assert!(settings.strategy.exit.is_configured());

        let risk = settings.strategy.risk_settings();
        assert_eq!(risk.position_sizing, PositionSizing::Fixed { fixed_size: 0.5 });
        assert_eq!(risk.max_open_positions, 2);
        assert_eq!(risk.signal_whitelist, vec![TradeSignal::Buy]);
    }

    #[test]
    fn unknown_sizing_mode_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
            [exchange]
            [ml_api]
            endpoint = "http://ml/predict"
            [strategy.position_size]
            mode = "kelly"
            "#,
        );

        assert!(matches!(load_settings_from(&path), Err(Error::LoadError(_))));
    }

    #[test]
    fn live_mode_without_credentials_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
            [exchange]
            [ml_api]
            endpoint = "http://ml/predict"
            [strategy]
            dry_run = false
            "#,
        );

        assert!(matches!(load_settings_from(&path), Err(Error::Invalid(_))));
    }

    #[test]
    fn secrets_are_not_debug_printed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
            [exchange]
            api_key = "very-secret-key"
            [ml_api]
            endpoint = "http://ml/predict"
            "#,
        );

        let settings = load_settings_from(&path).unwrap();
        assert!(!format!("{:?}", settings.exchange).contains("very-secret-key"));
    }

    #[test]
    fn env_var_overrides_nested_file_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
            [exchange]
            passphrase = "from-file"
            [ml_api]
            endpoint = "http://ml/predict"
            "#,
        );

        // Only `exchange.passphrase` is read from the environment here; no other test asserts on it.
        unsafe { std::env::set_var("APP_EXCHANGE__PASSPHRASE", "from-env") };
        let loaded = load_settings_from(&path);
        unsafe { std::env::remove_var("APP_EXCHANGE__PASSPHRASE") };

        assert_eq!(loaded.unwrap().exchange.passphrase, "from-env");
    }
}

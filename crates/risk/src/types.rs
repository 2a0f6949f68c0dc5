// In crates/risk/src/types.rs

use core_types::TradeSignal;

/// How the size of a new order is derived.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionSizing {
    /// Spend a fraction of the available quote balance, capped at `max_exposure_usd`.
    Percent {
        percent_of_balance: f64,
        max_exposure_usd: f64,
    },
    /// Always trade the same base-currency amount.
    Fixed { fixed_size: f64 },
}

impl Default for PositionSizing {
    fn default() -> Self {
        PositionSizing::Percent {
            percent_of_balance: 0.01,
            max_exposure_usd: 1e9,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimpleRiskSettings {
    /// Signals allowed to trade.
    pub signal_whitelist: Vec<TradeSignal>,
    pub min_confidence: f64,
    pub min_profit_after_fee: f64,
    /// Base the limit price on the model's expected price instead of the current one.
    pub use_expected_price: bool,
    /// Fractional pad applied to the limit price (e.g. 0.001 for 0.1%).
    pub limit_price_slippage: f64,
    pub position_sizing: PositionSizing,
    pub max_open_positions: usize,
}

impl Default for SimpleRiskSettings {
    fn default() -> Self {
        Self {
            signal_whitelist: vec![TradeSignal::Buy, TradeSignal::Sell],
            min_confidence: 0.6,
            min_profit_after_fee: 0.0,
            use_expected_price: true,
            limit_price_slippage: 0.001,
            position_sizing: PositionSizing::default(),
            max_open_positions: 10,
        }
    }
}

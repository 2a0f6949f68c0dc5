// In crates/risk/src/simple_manager.rs

use crate::types::{PositionSizing, SimpleRiskSettings};
use crate::{Error, Result, RiskManager};
use core_types::{round_to_precision, PredictionSignal, Side, PRECISION_DP};
use num_traits::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// A threshold-based risk manager for prediction-driven trading.
///
/// This manager implements three groups of rules:
/// 1. Vetoes predictions whose signal is not whitelisted, or whose confidence or
///    profit-after-fee is below the configured minimum.
/// 2. Prices limit orders off the model's expected price, padding with slippage
///    only when the expected price is better than the market.
/// 3. Sizes orders either as a fraction of the quote balance or as a fixed amount,
///    and caps the number of live orders.
#[derive(Debug)]
pub struct SimpleRiskManager {
    /// The configuration for this risk manager instance.
    settings: SimpleRiskSettings,
    slippage: Decimal,
}

impl SimpleRiskManager {
    /// Creates a new `SimpleRiskManager` instance from its settings.
    pub fn new(settings: SimpleRiskSettings) -> Self {
        let slippage = Decimal::from_f64(settings.limit_price_slippage).unwrap_or_default();
        Self { settings, slippage }
    }
}

fn to_decimal(value: f64, field: &str) -> Result<Decimal> {
    Decimal::from_f64(value)
        .ok_or_else(|| Error::InvalidParameters(format!("{} is not a finite number: {}", field, value)))
}

impl RiskManager for SimpleRiskManager {
    fn name(&self) -> &'static str {
        "SimpleRiskManager"
    }

    fn check_signal(&self, prediction: &PredictionSignal) -> Result<()> {
        // Rule: the signal must be whitelisted.
        if !self.settings.signal_whitelist.contains(&prediction.signal) {
            return Err(Error::Vetoed {
                reason: format!("Signal '{}' is not in the whitelist", prediction.signal),
            });
        }

        // Rule: confidence must reach the minimum. Written so that NaN fails.
        if !(prediction.confidence >= self.settings.min_confidence) {
            return Err(Error::Vetoed {
                reason: format!(
                    "Signal confidence ({:.4}) is below threshold ({:.4})",
                    prediction.confidence, self.settings.min_confidence
                ),
            });
        }

        // Rule: expected profit after fees must reach the minimum.
        if !(prediction.profit_after_fee >= self.settings.min_profit_after_fee) {
            return Err(Error::Vetoed {
                reason: format!(
                    "Profit after fee ({:.6}) is below threshold ({:.6})",
                    prediction.profit_after_fee, self.settings.min_profit_after_fee
                ),
            });
        }

        Ok(())
    }

    fn limit_price(&self, prediction: &PredictionSignal, side: Side) -> Decimal {
        let current = prediction.current_price;
        let base = if self.settings.use_expected_price {
            prediction.expected_price()
        } else {
            current
        };

        // Slippage is only added when the base price is more favourable than the market.
        let price = match side {
            Side::Buy if base > current => base * (dec!(1) + self.slippage),
            Side::Sell if base < current => base * (dec!(1) - self.slippage),
            _ => base,
        };
        round_to_precision(price)
    }

    fn requires_balance(&self) -> bool {
        matches!(self.settings.position_sizing, PositionSizing::Percent { .. })
    }

    fn position_size(&self, price: Decimal, available_balance: Option<Decimal>) -> Result<Decimal> {
        match &self.settings.position_sizing {
            PositionSizing::Percent {
                percent_of_balance,
                max_exposure_usd,
            } => {
                if !(*percent_of_balance > 0.0 && *percent_of_balance <= 1.0) {
                    return Err(Error::InvalidParameters(format!(
                        "percent_of_balance must be in (0, 1], got {}",
                        percent_of_balance
                    )));
                }
                if price <= Decimal::ZERO {
                    return Err(Error::InvalidParameters(format!("Cannot size an order at price {}", price)));
                }
                let balance = available_balance.ok_or_else(|| {
                    Error::InvalidParameters("Percent sizing requires the available balance".to_string())
                })?;

                let pct = to_decimal(*percent_of_balance, "percent_of_balance")?;
                let max_exposure = to_decimal(*max_exposure_usd, "max_exposure_usd")?;
                let allocated_quote = (balance * pct).min(max_exposure);

                // Truncate so that size * price never exceeds the allocation.
                let size = (allocated_quote / price)
                    .round_dp_with_strategy(PRECISION_DP, RoundingStrategy::ToZero)
                    .normalize();
                tracing::debug!(
                    %balance, %pct, %allocated_quote, %size,
                    "Computed percent-of-balance position size."
                );
                Ok(size)
            }
            PositionSizing::Fixed { fixed_size } => {
                if *fixed_size < 0.0 {
                    return Err(Error::InvalidParameters(format!("fixed_size must not be negative, got {}", fixed_size)));
                }
                Ok(round_to_precision(to_decimal(*fixed_size, "fixed_size")?))
            }
        }
    }

    fn check_open_positions(&self, open_orders: usize) -> Result<()> {
        if open_orders >= self.settings.max_open_positions {
            return Err(Error::Vetoed {
                reason: format!(
                    "Open positions limit reached ({} of {})",
                    open_orders, self.settings.max_open_positions
                ),
            });
        }
        Ok(())
    }
}

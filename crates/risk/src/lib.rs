// In crates/risk/src/lib.rs

use core_types::{PredictionSignal, Side};
use rust_decimal::Decimal;

pub mod error;
pub mod simple_manager;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use simple_manager::SimpleRiskManager;
pub use types::{PositionSizing, SimpleRiskSettings};

/// The universal interface for a risk management module.
///
/// A `RiskManager` decides whether a prediction is good enough to act on, what
/// limit price to quote, how large the order should be, and whether there is
/// room for another open order.
pub trait RiskManager: Send + Sync {
    /// The name of the risk management strategy.
    fn name(&self) -> &'static str;

    /// Checks a prediction against the configured signal rules.
    ///
    /// Returns `Err(Error::Vetoed)` carrying the first rule that failed.
    fn check_signal(&self, prediction: &PredictionSignal) -> Result<()>;

    /// `true` when the prediction passes every signal rule.
    ///
    /// The rejection reason is reported at debug level.
    fn should_trade(&self, prediction: &PredictionSignal) -> bool {
        match self.check_signal(prediction) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(risk_manager = self.name(), reason = %e, "Prediction rejected.");
                false
            }
        }
    }

    /// The limit price for an order on `side`, rounded to exchange precision.
    fn limit_price(&self, prediction: &PredictionSignal, side: Side) -> Decimal;

    /// Whether `position_size` needs the available quote balance.
    fn requires_balance(&self) -> bool;

    /// The order size in base currency for the given limit price.
    ///
    /// # Arguments
    ///
    /// * `price`: The limit price computed for the order.
    /// * `available_balance`: The free quote balance, when `requires_balance` is true.
    fn position_size(&self, price: Decimal, available_balance: Option<Decimal>) -> Result<Decimal>;

    /// Vetoes a new order when `open_orders` already reaches the configured cap.
    fn check_open_positions(&self, open_orders: usize) -> Result<()>;
}

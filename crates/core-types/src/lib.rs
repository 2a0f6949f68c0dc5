// In crates/core-types/src/lib.rs

pub mod order;
pub mod signal;
pub mod types;

// Re-export the most important types for easy access from other crates.
pub use order::{OrderRecord, OrderState};
pub use signal::{PredictionSignal, TradeSignal};
pub use types::{round_to_precision, Candle, OrderRequest, OrderType, Side, Symbol, PRECISION_DP};

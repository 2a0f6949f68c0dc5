// In crates/core-types/src/signal.rs

use crate::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// The trade direction emitted by the prediction service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSignal {
    Buy,
    Sell,
    Hold,
    /// Any value the bot does not recognise.
    #[serde(other)]
    Unknown,
}

impl TradeSignal {
    /// Maps the signal to an order side. Only `buy` and `sell` are tradeable.
    pub fn side(&self) -> Option<Side> {
        match self {
            TradeSignal::Buy => Some(Side::Buy),
            TradeSignal::Sell => Some(Side::Sell),
            TradeSignal::Hold | TradeSignal::Unknown => None,
        }
    }
}

impl fmt::Display for TradeSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TradeSignal::Buy => "buy",
            TradeSignal::Sell => "sell",
            TradeSignal::Hold => "hold",
            TradeSignal::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// One prediction record, as returned by the ML service on every poll.
///
/// Extra fields in the payload are ignored. The record is discarded once the
/// decision cycle that received it completes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PredictionSignal {
    pub signal: TradeSignal,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub confidence: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub profit_after_fee: f64,
    pub current_price: Decimal,
    #[serde(default)]
    pub expected_price: Option<Decimal>,
    /// Advisory only.
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub predicted_return: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    String(String),
}

impl NumberOrString {
    fn into_f64<E: serde::de::Error>(self) -> std::result::Result<f64, E> {
        let value = match self {
            NumberOrString::Number(n) => n,
            NumberOrString::String(s) => s.trim().parse().map_err(E::custom)?,
        };
        // `"NaN"` and `"inf"` parse as f64 but would slip past every threshold comparison.
        if !value.is_finite() {
            return Err(E::custom(format!("expected a finite number, got {}", value)));
        }
        Ok(value)
    }
}

// The service sometimes sends numeric fields as strings.
fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    NumberOrString::deserialize(deserializer)?.into_f64()
}

fn lenient_opt_f64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<f64>, D::Error> {
    Option::<NumberOrString>::deserialize(deserializer)?
        .map(NumberOrString::into_f64)
        .transpose()
}

impl PredictionSignal {
    /// The model's expected price, or the current price when the model gave none.
    pub fn expected_price(&self) -> Decimal {
        self.expected_price.unwrap_or(self.current_price)
    }
}

// In crates/core-types/src/types.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The number of fractional digits every price and size is rounded to
/// before it is stored or sent to the exchange.
pub const PRECISION_DP: u32 = 8;

/// Rounds a price or size to the exchange precision.
pub fn round_to_precision(value: Decimal) -> Decimal {
    value.round_dp(PRECISION_DP).normalize()
}

/// An instrument identifier in exchange notation, e.g. `BTC-USDT`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    /// The quote currency of the pair (`BTC-USDT` -> `USDT`).
    ///
    /// Falls back to `USDT` when the symbol has no `-` separator.
    pub fn quote_currency(&self) -> &str {
        match self.0.rsplit_once('-') {
            Some((_, quote)) if !quote.is_empty() => quote,
            _ => "USDT",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The direction of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The order types the bot knows how to submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    #[default]
    Limit,
    Market,
    PostOnly,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Limit => "limit",
            OrderType::Market => "market",
            OrderType::PostOnly => "post_only",
        }
    }

    /// Market orders are the only ones sent without a price.
    pub fn requires_price(&self) -> bool {
        !matches!(self, OrderType::Market)
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single OHLCV candle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candle {
    /// Open time in unix milliseconds.
    pub open_time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// A fully priced and sized order, ready to be handed to an executor.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: Symbol,
    pub side: Side,
    pub price: Decimal,
    pub size: Decimal,
    pub order_type: OrderType,
}

impl OrderRequest {
    /// Builds a request with price and size already rounded to exchange precision.
    pub fn new(symbol: Symbol, side: Side, price: Decimal, size: Decimal, order_type: OrderType) -> Self {
        Self {
            symbol,
            side,
            price: round_to_precision(price),
            size: round_to_precision(size),
            order_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rounds_to_eight_places() {
        assert_eq!(round_to_precision(dec!(0.123456789123)), dec!(0.12345679));
        assert_eq!(round_to_precision(dec!(102.102)), dec!(102.102));
    }

    #[test]
    fn quote_currency_from_symbol() {
        assert_eq!(Symbol::new("BTC-USDT").quote_currency(), "USDT");
        assert_eq!(Symbol::new("ETH-USDC").quote_currency(), "USDC");
        assert_eq!(Symbol::new("BTCUSDT").quote_currency(), "USDT");
    }

    #[test]
    fn order_request_rounds_inputs() {
        let req = OrderRequest::new(
            Symbol::new("BTC-USDT"),
            Side::Buy,
            dec!(100.000000004),
            dec!(0.0000000149),
            OrderType::Limit,
        );
        assert_eq!(req.price, dec!(100));
        assert_eq!(req.size, dec!(0.00000001));
    }
}

// In crates/core-types/src/order.rs

use crate::{OrderRequest, OrderType, Side, Symbol};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// Lifecycle state of an order known to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderState {
    Live,
    Canceled,
    Filled,
}

impl OrderState {
    /// Maps an exchange state string; anything unrecognised is treated as live.
    pub fn from_exchange(state: &str) -> Self {
        match state {
            "canceled" | "cancelled" | "mmp_canceled" => OrderState::Canceled,
            "filled" => OrderState::Filled,
            _ => OrderState::Live,
        }
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderState::Live => "live",
            OrderState::Canceled => "canceled",
            OrderState::Filled => "filled",
        };
        f.write_str(s)
    }
}

/// One entry of the order ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRecord {
    pub order_id: String,
    pub symbol: Symbol,
    pub side: Side,
    pub price: Decimal,
    pub size: Decimal,
    pub order_type: OrderType,
    pub state: OrderState,
    /// RFC 3339 or unix-millisecond timestamp string.
    pub created_at: String,
}

impl OrderRecord {
    /// A freshly placed, live record mirroring the request.
    pub fn from_request(order_id: impl Into<String>, request: &OrderRequest, created_at: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            symbol: request.symbol.clone(),
            side: request.side,
            price: request.price,
            size: request.size,
            order_type: request.order_type,
            state: OrderState::Live,
            created_at: created_at.into(),
        }
    }

    pub fn is_live(&self) -> bool {
        self.state == OrderState::Live
    }
}

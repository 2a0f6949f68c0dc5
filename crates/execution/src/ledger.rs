// In crates/execution/src/ledger.rs

use core_types::{OrderRecord, OrderState};
use std::collections::HashMap;

/// In-memory record of every order placed during this process lifetime.
///
/// Canceled orders are kept with their terminal state; only `live` entries
/// count toward the open-position limit.
#[derive(Debug, Default)]
pub struct OrderLedger {
    orders: HashMap<String, OrderRecord>,
}

impl OrderLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record keyed by its order id, returning any record it replaced.
    pub fn insert(&mut self, record: OrderRecord) -> Option<OrderRecord> {
        self.orders.insert(record.order_id.clone(), record)
    }

    pub fn get(&self, order_id: &str) -> Option<&OrderRecord> {
        self.orders.get(order_id)
    }

    /// Sets the state of a known order to `Canceled`. Returns false for unknown ids.
    pub fn mark_canceled(&mut self, order_id: &str) -> bool {
        match self.orders.get_mut(order_id) {
            Some(record) => {
                record.state = OrderState::Canceled;
                true
            }
            None => false,
        }
    }

    pub fn live_count(&self) -> usize {
        self.orders.values().filter(|o| o.is_live()).count()
    }

    /// A snapshot of the live orders, so callers can cancel while iterating.
    pub fn live_orders(&self) -> Vec<OrderRecord> {
        self.orders.values().filter(|o| o.is_live()).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{OrderRequest, OrderType, Side, Symbol};
    use rust_decimal_macros::dec;

    fn record(id: &str) -> OrderRecord {
        let request = OrderRequest::new(Symbol::new("BTC-USDT"), Side::Buy, dec!(100), dec!(0.01), OrderType::Limit);
        OrderRecord::from_request(id, &request, "2024-01-01T00:00:00Z")
    }

    #[test]
    fn canceled_orders_are_retained_but_not_live() {
        let mut ledger = OrderLedger::new();
        ledger.insert(record("a"));
        ledger.insert(record("b"));
        assert_eq!(ledger.live_count(), 2);

        assert!(ledger.mark_canceled("a"));
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.live_count(), 1);
        assert_eq!(ledger.get("a").map(|o| o.state), Some(OrderState::Canceled));
        assert_eq!(ledger.live_orders().len(), 1);
    }

    #[test]
    fn marking_unknown_order_is_a_no_op() {
        let mut ledger = OrderLedger::new();
        assert!(!ledger.mark_canceled("missing"));
        assert!(ledger.is_empty());
    }
}

// In crates/execution/src/simulated.rs

use crate::{synthesize_order_id, Executor, OrderLedger, Result};
use api_client::CancelAck;
use async_trait::async_trait;
use chrono::Utc;
use core_types::{OrderRecord, OrderRequest, Symbol};

/// A dry-run executor. Orders never leave the process; they are recorded in the
/// ledger under a locally synthesized id.
#[derive(Debug, Default)]
pub struct SimulatedExecutor {
    sequence: u64,
}

impl SimulatedExecutor {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Executor for SimulatedExecutor {
    fn name(&self) -> &'static str {
        "SimulatedExecutor"
    }

    async fn place_order(&mut self, order_request: &OrderRequest, ledger: &mut OrderLedger) -> Result<OrderRecord> {
        let order_id = synthesize_order_id("dry", &mut self.sequence);
        let record = OrderRecord::from_request(order_id, order_request, Utc::now().to_rfc3339());
        ledger.insert(record.clone());

        tracing::info!(
            order_id = %record.order_id,
            symbol = %record.symbol,
            side = %record.side,
            price = %record.price,
            size = %record.size,
            "[DRY RUN] Order recorded."
        );
        Ok(record)
    }

    async fn cancel_order(&mut self, symbol: &Symbol, order_id: &str, ledger: &mut OrderLedger) -> Result<CancelAck> {
        if ledger.mark_canceled(order_id) {
            tracing::info!(%symbol, %order_id, "[DRY RUN] Order canceled.");
        } else {
            tracing::debug!(%symbol, %order_id, "[DRY RUN] Cancel requested for an unknown order.");
        }
        Ok(CancelAck::canceled(order_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{OrderState, OrderType, Side};
    use rust_decimal_macros::dec;

    fn request() -> OrderRequest {
        OrderRequest::new(Symbol::new("BTC-USDT"), Side::Buy, dec!(102.1), dec!(0.01), OrderType::Limit)
    }

    #[tokio::test]
    async fn dry_run_order_is_live_in_ledger() {
        let mut executor = SimulatedExecutor::new();
        let mut ledger = OrderLedger::new();

        let record = executor.place_order(&request(), &mut ledger).await.unwrap();
        assert!(record.order_id.starts_with("dry_"));
        assert_eq!(record.state, OrderState::Live);
        assert_eq!(record.price, dec!(102.1));
        assert_eq!(record.size, dec!(0.01));
        assert_eq!(ledger.get(&record.order_id), Some(&record));
    }

    #[tokio::test]
    async fn ids_are_unique_within_the_same_millisecond() {
        let mut executor = SimulatedExecutor::new();
        let mut ledger = OrderLedger::new();
        for _ in 0..50 {
            executor.place_order(&request(), &mut ledger).await.unwrap();
        }
        assert_eq!(ledger.len(), 50);
    }

    #[tokio::test]
    async fn cancel_is_idempotent() {
        let mut executor = SimulatedExecutor::new();
        let mut ledger = OrderLedger::new();
        let record = executor.place_order(&request(), &mut ledger).await.unwrap();
        let symbol = Symbol::new("BTC-USDT");

        for _ in 0..2 {
            let ack = executor.cancel_order(&symbol, &record.order_id, &mut ledger).await.unwrap();
            assert!(ack.is_confirmed());
            assert_eq!(ledger.get(&record.order_id).map(|o| o.state), Some(OrderState::Canceled));
        }
        assert_eq!(ledger.live_count(), 0);
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn cancel_of_unknown_order_still_acknowledges() {
        let mut executor = SimulatedExecutor::new();
        let mut ledger = OrderLedger::new();
        let ack = executor.cancel_order(&Symbol::new("BTC-USDT"), "nope", &mut ledger).await.unwrap();
        assert_eq!(ack.ord_id.as_deref(), Some("nope"));
        assert!(ledger.is_empty());
    }
}

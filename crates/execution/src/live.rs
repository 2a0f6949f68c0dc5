// In crates/execution/src/live.rs

use crate::{synthesize_order_id, Error, Executor, OrderLedger, Result};
use api_client::{CancelAck, ExchangeGateway, OrderAck};
use async_trait::async_trait;
use chrono::Utc;
use core_types::{round_to_precision, OrderRecord, OrderRequest, OrderState, Symbol};
use rust_decimal::Decimal;
use std::sync::Arc;

/// An executor that places real orders through an `ExchangeGateway`.
#[derive(Clone)]
pub struct LiveExecutor {
    /// The gateway used for every order operation.
    gateway: Arc<dyn ExchangeGateway>,
    sequence: u64,
}

impl LiveExecutor {
    /// Creates a new `LiveExecutor`.
    ///
    /// # Arguments
    ///
    /// * `gateway`: The exchange gateway, shared with the rest of the engine.
    pub fn new(gateway: Arc<dyn ExchangeGateway>) -> Self {
        Self { gateway, sequence: 0 }
    }

    /// Builds the ledger record from the acknowledgment, falling back to the
    /// requested values for anything the exchange left out.
    fn record_from_ack(&mut self, ack: &OrderAck, request: &OrderRequest) -> OrderRecord {
        let order_id = match ack.order_id() {
            Some(id) => id.to_string(),
            None => {
                let id = synthesize_order_id("local", &mut self.sequence);
                tracing::warn!(order_id = %id, "Exchange returned no order id; using a local id.");
                id
            }
        };

        let mut record = OrderRecord::from_request(order_id, request, created_at(ack));
        if let Some(px) = positive_decimal(&ack.px).or_else(|| positive_decimal(&ack.fill_px)) {
            record.price = round_to_precision(px);
        }
        if let Some(sz) = positive_decimal(&ack.sz) {
            record.size = round_to_precision(sz);
        }
        if let Some(state) = ack.state.as_deref().filter(|s| !s.is_empty()) {
            record.state = OrderState::from_exchange(state);
        }
        record
    }
}

fn positive_decimal(value: &Option<String>) -> Option<Decimal> {
    value
        .as_deref()
        .and_then(|s| s.parse::<Decimal>().ok())
        .filter(|d| *d > Decimal::ZERO)
}

fn created_at(ack: &OrderAck) -> String {
    match ack.c_time.as_deref() {
        Some(ts) if !ts.is_empty() => ts.to_string(),
        _ => Utc::now().to_rfc3339(),
    }
}

#[async_trait]
impl Executor for LiveExecutor {
    fn name(&self) -> &'static str {
        "LiveExecutor"
    }

    async fn place_order(&mut self, order_request: &OrderRequest, ledger: &mut OrderLedger) -> Result<OrderRecord> {
        tracing::info!(?order_request, "Placing live order...");

        let ack = self.gateway.place_order(order_request).await?;
        let record = self.record_from_ack(&ack, order_request);
        ledger.insert(record.clone());

        tracing::info!(
            order_id = %record.order_id,
            symbol = %record.symbol,
            side = %record.side,
            price = %record.price,
            size = %record.size,
            state = %record.state,
            "Order placed."
        );
        Ok(record)
    }

    async fn cancel_order(&mut self, symbol: &Symbol, order_id: &str, ledger: &mut OrderLedger) -> Result<CancelAck> {
        let ack = self.gateway.cancel_order(symbol, order_id).await?;

        if !ack.is_confirmed() {
            return Err(Error::ExecutionFailed {
                reason: format!(
                    "Cancellation of {} not confirmed: sCode={} sMsg={}",
                    order_id,
                    ack.s_code.as_deref().unwrap_or(""),
                    ack.s_msg.as_deref().unwrap_or("")
                ),
            });
        }

        ledger.mark_canceled(order_id);
        tracing::info!(%symbol, %order_id, "Order canceled.");
        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{Candle, OrderType, Side};
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    /// Replays canned acknowledgments and counts calls.
    #[derive(Default)]
    struct FakeGateway {
        place_ack: Mutex<Option<api_client::Result<OrderAck>>>,
        cancel_ack: Mutex<Option<api_client::Result<CancelAck>>>,
    }

    #[async_trait]
    impl ExchangeGateway for FakeGateway {
        async fn fetch_candles(&self, _: &Symbol, _: &str, _: u16) -> api_client::Result<Vec<Candle>> {
            Ok(Vec::new())
        }

        async fn get_balance(&self, _: &str) -> api_client::Result<Decimal> {
            Ok(Decimal::ZERO)
        }

        async fn place_order(&self, _: &OrderRequest) -> api_client::Result<OrderAck> {
            self.place_ack.lock().unwrap().take().unwrap_or_else(|| Ok(OrderAck::default()))
        }

        async fn cancel_order(&self, _: &Symbol, _: &str) -> api_client::Result<CancelAck> {
            self.cancel_ack.lock().unwrap().take().unwrap_or_else(|| Ok(CancelAck::default()))
        }
    }

    fn request() -> OrderRequest {
        OrderRequest::new(Symbol::new("BTC-USDT"), Side::Buy, dec!(102.1), dec!(0.01), OrderType::Limit)
    }

    fn executor(gateway: FakeGateway) -> LiveExecutor {
        LiveExecutor::new(Arc::new(gateway))
    }

    #[tokio::test]
    async fn record_uses_exchange_id_and_falls_back_to_requested_values() {
        let gateway = FakeGateway::default();
        *gateway.place_ack.lock().unwrap() = Some(Ok(OrderAck {
            ord_id: Some("312269865356374016".into()),
            s_code: Some("0".into()),
            ..OrderAck::default()
        }));
        let mut exec = executor(gateway);
        let mut ledger = OrderLedger::new();

        let record = exec.place_order(&request(), &mut ledger).await.unwrap();
        assert_eq!(record.order_id, "312269865356374016");
        assert_eq!(record.price, dec!(102.1));
        assert_eq!(record.size, dec!(0.01));
        assert_eq!(record.state, OrderState::Live);
        assert_eq!(ledger.live_count(), 1);
    }

    #[tokio::test]
    async fn empty_price_falls_back_to_fill_price() {
        let gateway = FakeGateway::default();
        *gateway.place_ack.lock().unwrap() = Some(Ok(OrderAck {
            ord_id: Some("7".into()),
            px: Some(String::new()),
            fill_px: Some("101.5".into()),
            ..OrderAck::default()
        }));
        let mut exec = executor(gateway);
        let mut ledger = OrderLedger::new();

        let record = exec.place_order(&request(), &mut ledger).await.unwrap();
        assert_eq!(record.price, dec!(101.5));
    }

    #[tokio::test]
    async fn missing_ids_get_a_local_id() {
        let mut exec = executor(FakeGateway::default());
        let mut ledger = OrderLedger::new();
        let record = exec.place_order(&request(), &mut ledger).await.unwrap();
        assert!(record.order_id.starts_with("local_"));
    }

    #[tokio::test]
    async fn gateway_failure_leaves_ledger_untouched() {
        let gateway = FakeGateway::default();
        *gateway.place_ack.lock().unwrap() = Some(Err(api_client::Error::ApiError {
            code: "51008".into(),
            msg: "Insufficient balance".into(),
            payload: serde_json::Value::Null,
        }));
        let mut exec = executor(gateway);
        let mut ledger = OrderLedger::new();

        let err = exec.place_order(&request(), &mut ledger).await.unwrap_err();
        assert!(matches!(err, Error::ApiClientError(_)));
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn confirmed_cancel_retains_record_as_canceled() {
        let gateway = FakeGateway::default();
        *gateway.place_ack.lock().unwrap() = Some(Ok(OrderAck {
            ord_id: Some("42".into()),
            ..OrderAck::default()
        }));
        *gateway.cancel_ack.lock().unwrap() = Some(Ok(CancelAck {
            ord_id: Some("42".into()),
            s_code: Some("0".into()),
            ..CancelAck::default()
        }));
        let mut exec = executor(gateway);
        let mut ledger = OrderLedger::new();
        exec.place_order(&request(), &mut ledger).await.unwrap();

        exec.cancel_order(&Symbol::new("BTC-USDT"), "42", &mut ledger).await.unwrap();
        assert_eq!(ledger.get("42").map(|o| o.state), Some(OrderState::Canceled));
        assert_eq!(ledger.live_count(), 0);
    }

    #[tokio::test]
    async fn unconfirmed_cancel_is_an_error_and_order_stays_live() {
        let gateway = FakeGateway::default();
        *gateway.place_ack.lock().unwrap() = Some(Ok(OrderAck {
            ord_id: Some("42".into()),
            ..OrderAck::default()
        }));
        *gateway.cancel_ack.lock().unwrap() = Some(Ok(CancelAck {
            s_code: Some("51400".into()),
            s_msg: Some("Order does not exist".into()),
            ..CancelAck::default()
        }));
        let mut exec = executor(gateway);
        let mut ledger = OrderLedger::new();
        exec.place_order(&request(), &mut ledger).await.unwrap();

        let err = exec.cancel_order(&Symbol::new("BTC-USDT"), "42", &mut ledger).await.unwrap_err();
        assert!(matches!(err, Error::ExecutionFailed { .. }));
        assert_eq!(ledger.live_count(), 1);
    }
}

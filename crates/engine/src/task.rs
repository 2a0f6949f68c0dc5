// In crates/engine/src/task.rs

use crate::sweeper::order_age;
use crate::{Error, Result};
use api_client::{CancelAck, ExchangeGateway};
use app_config::ExitSettings;
use chrono::{DateTime, Utc};
use core_types::{OrderRecord, OrderRequest, OrderType, PredictionSignal, Side, Symbol};
use execution::{Executor, OrderLedger};
use risk::RiskManager;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

/// The decision engine for a single symbol.
///
/// Owns the order ledger. Every placement and cancellation goes through the
/// executor, which is either live or dry-run.
pub struct TradingTask {
    symbol: Symbol,
    order_type: OrderType,
    cancel_after: Duration,
    exit: ExitSettings,
    risk_manager: Box<dyn RiskManager>,
    executor: Box<dyn Executor>,
    /// Used for balance queries when sizing needs them.
    gateway: Arc<dyn ExchangeGateway>,
    ledger: OrderLedger,
}

impl TradingTask {
    pub fn new(
        symbol: Symbol,
        order_type: OrderType,
        cancel_after: Duration,
        exit: ExitSettings,
        risk_manager: Box<dyn RiskManager>,
        executor: Box<dyn Executor>,
        gateway: Arc<dyn ExchangeGateway>,
    ) -> Self {
        Self {
            symbol,
            order_type,
            cancel_after,
            exit,
            risk_manager,
            executor,
            gateway,
            ledger: OrderLedger::new(),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn ledger(&self) -> &OrderLedger {
        &self.ledger
    }

    pub fn executor_name(&self) -> &'static str {
        self.executor.name()
    }

    pub fn should_trade(&self, prediction: &PredictionSignal) -> bool {
        self.risk_manager.should_trade(prediction)
    }

    pub fn calc_limit_price(&self, prediction: &PredictionSignal, side: Side) -> Decimal {
        self.risk_manager.limit_price(prediction, side)
    }

    /// Sizes an order at `price`. Queries the quote balance only when the sizing mode needs it.
    pub async fn calc_size(&self, price: Decimal) -> Result<Decimal> {
        let balance = if self.risk_manager.requires_balance() {
            let currency = self.symbol.quote_currency();
            let balance = self.gateway.get_balance(currency).await?;
            tracing::debug!(%currency, %balance, "Fetched available balance.");
            Some(balance)
        } else {
            None
        };
        Ok(self.risk_manager.position_size(price, balance)?)
    }

    /// Places an order. Failures are logged and leave the ledger unchanged.
    pub async fn place_order(&mut self, side: Side, price: Decimal, size: Decimal) -> Option<OrderRecord> {
        let request = OrderRequest::new(self.symbol.clone(), side, price, size, self.order_type);
        match self.executor.place_order(&request, &mut self.ledger).await {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    symbol = %request.symbol,
                    side = %request.side,
                    price = %request.price,
                    size = %request.size,
                    "Order placement failed."
                );
                None
            }
        }
    }

    /// Cancels an order. A failed cancellation is logged and leaves the ledger unchanged.
    pub async fn cancel_order(&mut self, order_id: &str) -> Result<CancelAck> {
        let symbol = self.symbol.clone();
        self.executor
            .cancel_order(&symbol, order_id, &mut self.ledger)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, %symbol, %order_id, "Order cancellation failed.");
                Error::from(e)
            })
    }

    /// Runs one prediction through the filter, pricing, sizing and position cap,
    /// and places an order if everything passes.
    ///
    /// Returns the placed record, or `None` when the prediction did not lead to an order.
    /// Errors mean the cycle was aborted: a balance query failed or sizing is misconfigured.
    pub async fn process_prediction(&mut self, prediction: &PredictionSignal) -> Result<Option<OrderRecord>> {
        let Some(side) = prediction.signal.side() else {
            tracing::debug!(signal = %prediction.signal, "Signal is not tradeable; ignoring.");
            return Ok(None);
        };

        if !self.should_trade(prediction) {
            return Ok(None);
        }

        let price = self.calc_limit_price(prediction, side);
        if price <= Decimal::ZERO {
            tracing::warn!(%price, "Limit price is not positive; skipping.");
            return Ok(None);
        }
        let size = self.calc_size(price).await?;
        if size <= Decimal::ZERO {
            tracing::warn!(%price, %size, "Computed order size is not positive; skipping.");
            return Ok(None);
        }

        match self.risk_manager.check_open_positions(self.ledger.live_count()) {
            Ok(()) => {}
            Err(risk::Error::Vetoed { reason }) => {
                tracing::warn!(%reason, "Open position limit reached; skipping.");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        }

        let record = self.place_order(side, price, size).await;
        if let Some(record) = &record {
            if self.exit.is_configured() {
                tracing::info!(
                    order_id = %record.order_id,
                    take_profit_pct = ?self.exit.take_profit_pct,
                    stop_loss_pct = ?self.exit.stop_loss_pct,
                    "Exit targets configured; they are not monitored."
                );
            }
        }
        Ok(record)
    }

    /// Cancels every live order older than the unfilled timeout.
    pub async fn manage_orders(&mut self) -> usize {
        self.manage_orders_at(Utc::now()).await
    }

    /// The timeout sweep evaluated at `now`. Returns the number of confirmed cancellations.
    pub async fn manage_orders_at(&mut self, now: DateTime<Utc>) -> usize {
        let mut canceled = 0;
        for order in self.ledger.live_orders() {
            let age = order_age(&order.order_id, &order.created_at, now);
            if age <= self.cancel_after {
                continue;
            }
            tracing::info!(
                order_id = %order.order_id,
                age_secs = age.as_secs(),
                "Order unfilled past timeout; canceling."
            );
            if self.cancel_order(&order.order_id).await.is_ok() {
                canceled += 1;
            }
        }
        canceled
    }
}

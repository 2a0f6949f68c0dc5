// In crates/execution/src/lib.rs

use api_client::CancelAck;
use async_trait::async_trait;
use core_types::{OrderRecord, OrderRequest, Symbol};

pub mod error;
pub mod ledger;
pub mod live;
pub mod simulated;

// Re-export public types
pub use error::{Error, Result};
pub use ledger::OrderLedger;
pub use live::LiveExecutor;
pub use simulated::SimulatedExecutor;

/// The universal interface for an execution handler.
///
/// An `Executor` takes a priced and sized `OrderRequest` and submits it to a
/// target, which is either the live exchange or a local dry-run simulation.
/// The ledger is owned by the caller and passed in, so the executor only
/// records what it actually placed or canceled.
#[async_trait]
pub trait Executor: Send + Sync {
    /// The name of the executor (e.g., "LiveExecutor", "SimulatedExecutor").
    fn name(&self) -> &'static str;

    /// Places an order and records it in the ledger as live.
    ///
    /// # Arguments
    ///
    /// * `order_request`: The order to place. Price and size are already rounded.
    /// * `ledger`: The ledger to insert the resulting record into.
    ///
    /// # Returns
    ///
    /// The recorded `OrderRecord`. On failure the ledger is left untouched.
    async fn place_order(&mut self, order_request: &OrderRequest, ledger: &mut OrderLedger) -> Result<OrderRecord>;

    /// Cancels an order and marks it canceled in the ledger once confirmed.
    async fn cancel_order(&mut self, symbol: &Symbol, order_id: &str, ledger: &mut OrderLedger) -> Result<CancelAck>;
}

/// A process-unique order id of the form `{prefix}_{unix_millis}_{sequence}`.
pub(crate) fn synthesize_order_id(prefix: &str, sequence: &mut u64) -> String {
    *sequence += 1;
    format!("{}_{}_{}", prefix, chrono::Utc::now().timestamp_millis(), sequence)
}

// In crates/engine/src/lib.rs

pub mod error;
pub mod sweeper;
pub mod task;

pub use error::{Error, Result};
pub use task::TradingTask;

use api_client::ExchangeGateway;
use app_config::Settings;
use core_types::Symbol;
use execution::{Executor, LiveExecutor, SimulatedExecutor};
use predictor::PredictionSource;
use risk::SimpleRiskManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// The poll loop: fetches a prediction, runs it through the decision engine and
/// periodically sweeps stale orders.
pub struct Engine {
    source: Arc<dyn PredictionSource>,
    task: TradingTask,
    poll_interval: Duration,
    sweep_interval: Duration,
    last_sweep: Option<Instant>,
}

impl Engine {
    pub fn new(
        source: Arc<dyn PredictionSource>,
        task: TradingTask,
        poll_interval: Duration,
        sweep_interval: Duration,
    ) -> Self {
        Self {
            source,
            task,
            poll_interval,
            sweep_interval,
            last_sweep: None,
        }
    }

    /// Wires up the risk manager and executor described by `settings`.
    ///
    /// In dry-run mode orders are simulated locally; the gateway is still used
    /// for balance queries when sizing needs them.
    pub fn from_settings(
        settings: &Settings,
        gateway: Arc<dyn ExchangeGateway>,
        source: Arc<dyn PredictionSource>,
    ) -> Self {
        let strategy = &settings.strategy;
        let risk_manager = Box::new(SimpleRiskManager::new(strategy.risk_settings()));
        let executor: Box<dyn Executor> = if strategy.dry_run {
            Box::new(SimulatedExecutor::new())
        } else {
            Box::new(LiveExecutor::new(gateway.clone()))
        };

        let task = TradingTask::new(
            settings.ml_api.symbol(),
            strategy.order_type,
            strategy.order_management.cancel_after(),
            strategy.exit.clone(),
            risk_manager,
            executor,
            gateway,
        );
        Self::new(
            source,
            task,
            settings.ml_api.poll_interval(),
            strategy.order_management.sweep_interval(),
        )
    }

    pub fn task(&self) -> &TradingTask {
        &self.task
    }

    pub fn symbol(&self) -> &Symbol {
        self.task.symbol()
    }

    fn sweep_due(&self, now: Instant) -> bool {
        match self.last_sweep {
            None => true,
            Some(last) => now.duration_since(last) > self.sweep_interval,
        }
    }

    /// One fetch, decide and (when due) sweep iteration. Never fails: every
    /// error is logged and the iteration moves on.
    pub async fn run_once(&mut self) {
        let symbol = self.task.symbol().clone();
        match self.source.fetch_prediction(&symbol).await {
            Ok(prediction) => {
                tracing::info!(
                    %symbol,
                    signal = %prediction.signal,
                    confidence = prediction.confidence,
                    predicted_return = ?prediction.predicted_return,
                    updated_at = ?prediction.updated_at,
                    "Prediction received."
                );
                if let Err(e) = self.task.process_prediction(&prediction).await {
                    tracing::error!(error = %e, %symbol, "Decision cycle aborted.");
                }
            }
            Err(e) => tracing::warn!(error = %e, %symbol, "Failed to fetch prediction; skipping cycle."),
        }

        let now = Instant::now();
        if self.sweep_due(now) {
            let canceled = self.task.manage_orders().await;
            if canceled > 0 {
                tracing::info!(canceled, "Order sweep complete.");
            }
            self.last_sweep = Some(now);
        }
    }

    /// Runs until `shutdown` turns true or its sender is dropped.
    ///
    /// Shutdown is observed at the top of each iteration and during the sleep
    /// between iterations; an iteration in progress always completes.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            symbol = %self.task.symbol(),
            executor = self.task.executor_name(),
            poll_secs = self.poll_interval.as_secs(),
            sweep_secs = self.sweep_interval.as_secs(),
            "Starting poll loop."
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.run_once().await;

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::info!(open_orders = self.task.ledger().live_count(), "Poll loop stopped.");
    }
}

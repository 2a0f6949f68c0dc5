// In app/src/main.rs

use anyhow::{Context, Result};
use api_client::{ApiClient, ExchangeGateway};
use app_config::Settings;
use clap::{Parser, Subcommand};
use core_types::Symbol;
use engine::Engine;
use predictor::PredictionClient;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::prelude::*;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "A prediction-driven spot trading bot for OKX.")]
struct Cli {
    /// Base configuration file; `<dir>/<APP_ENVIRONMENT>.toml` is layered on top.
    #[arg(long, global = true, default_value = "config/base")]
    config: PathBuf,

    /// Overrides `strategy.log_level` (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs the poll loop until Ctrl+C.
    Run,

    /// Runs a single fetch, decide and sweep iteration.
    Once,

    /// Prints recent candles from the exchange.
    Candles {
        /// The instrument, e.g. "BTC-USDT". Defaults to `ml_api.symbol`.
        #[arg(short, long)]
        symbol: Option<String>,

        /// The bar size, e.g. "1m", "1H".
        #[arg(short, long, default_value = "1H")]
        timeframe: String,

        /// Number of candles (at most 300).
        #[arg(short, long, default_value_t = 100)]
        limit: u16,
    },

    /// Prints the available balance of a currency.
    Balance {
        /// Defaults to the quote currency of `ml_api.symbol`.
        #[arg(short, long)]
        currency: Option<String>,
    },
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = app_config::load_settings_from(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    let level = cli.log_level.as_deref().unwrap_or(settings.strategy.log_level.as_str());
    init_tracing(level)?;

    match cli.command {
        Commands::Run => handle_run(&settings).await?,
        Commands::Once => handle_once(&settings).await?,
        Commands::Candles { symbol, timeframe, limit } => {
            handle_candles(&settings, symbol, &timeframe, limit).await?
        }
        Commands::Balance { currency } => handle_balance(&settings, currency).await?,
    }

    Ok(())
}

fn init_tracing(level: &str) -> Result<()> {
    let default = LevelFilter::from_str(level).with_context(|| format!("Invalid log level '{}'", level))?;
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(
        Targets::new()
            .with_target("hyper", tracing::Level::WARN)
            .with_target("reqwest", tracing::Level::WARN)
            .with_default(default),
    );
    tracing_subscriber::registry().with(fmt_layer).init();
    Ok(())
}

fn build_engine(settings: &Settings) -> Result<Engine> {
    let gateway: Arc<dyn ExchangeGateway> = Arc::new(ApiClient::new(&settings.exchange)?);
    let source = Arc::new(PredictionClient::new(&settings.ml_api)?);

    tracing::info!(
        dry_run = settings.strategy.dry_run,
        endpoint = %source.endpoint(),
        symbol = %settings.ml_api.symbol,
        poll_interval_secs = settings.ml_api.poll_interval_seconds,
        simulated_trading = settings.exchange.simulated_trading,
        "Starting trading bot."
    );
    if !settings.strategy.dry_run {
        tracing::warn!("Dry run is disabled: orders will be sent to the exchange.");
    }

    Ok(Engine::from_settings(settings, gateway, source))
}

// --- "Run" Subcommand Logic ---

async fn handle_run(settings: &Settings) -> Result<()> {
    let mut engine = build_engine(settings)?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl+C, finishing current iteration..."),
            Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C; shutting down."),
        }
        let _ = shutdown_tx.send(true);
    });

    engine.run(shutdown_rx).await;
    tracing::info!("Trading bot stopped.");
    Ok(())
}

async fn handle_once(settings: &Settings) -> Result<()> {
    let mut engine = build_engine(settings)?;
    engine.run_once().await;

    for order in engine.task().ledger().live_orders() {
        println!(
            "{}  {} {} {} @ {}  {}",
            order.order_id, order.symbol, order.side, order.size, order.price, order.state
        );
    }
    Ok(())
}

// --- Exchange Query Subcommands ---

async fn handle_candles(settings: &Settings, symbol: Option<String>, timeframe: &str, limit: u16) -> Result<()> {
    let client = ApiClient::new(&settings.exchange)?;
    let symbol = symbol.map(Symbol::new).unwrap_or_else(|| settings.ml_api.symbol());

    let candles = client.fetch_candles(&symbol, timeframe, limit).await?;
    tracing::info!(%symbol, timeframe, count = candles.len(), "Fetched candles.");
    for c in candles {
        println!("{}  o={} h={} l={} c={} v={}", c.open_time, c.open, c.high, c.low, c.close, c.volume);
    }
    Ok(())
}

async fn handle_balance(settings: &Settings, currency: Option<String>) -> Result<()> {
    let client = ApiClient::new(&settings.exchange)?;
    let currency = currency.unwrap_or_else(|| settings.ml_api.symbol().quote_currency().to_string());

    let balance = client.get_balance(&currency).await?;
    println!("{} {}", balance, currency);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from(["app", "candles", "--limit", "5", "--config", "cfg/prod", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("cfg/prod"));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Commands::Candles { symbol, timeframe, limit } => {
                assert!(symbol.is_none());
                assert_eq!(timeframe, "1H");
                assert_eq!(limit, 5);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}

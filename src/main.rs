// =============================================================================
// bandwatch: Main Entry Point
// =============================================================================
//
// Loads configuration, starts the periodic monitor and the API server, then
// waits for Ctrl+C.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod alerts;
mod api;
mod app_state;
mod indicators;
mod market_data;
mod metrics;
mod monitor;
mod runtime_config;
mod types;
mod universe;

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::market_data::YahooClient;
use crate::runtime_config::RuntimeConfig;

const DEFAULT_CONFIG_PATH: &str = "bandwatch_config.json";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5001";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("bandwatch starting up");

    let config_path =
        std::env::var("BANDWATCH_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let mut config = RuntimeConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });

    // Override symbols from env if available.
    if let Ok(syms) = std::env::var("BANDWATCH_SYMBOLS") {
        config.set_symbols_from_list(&syms);
    }
    config.validate().context("invalid runtime configuration")?;

    info!(
        symbols = config.symbols.len(),
        band = %format!("{}/{}/{}", config.band.frequency, config.band.length, config.band.ma_mode),
        rsi = %format!("{}/{}", config.rsi.frequency, config.rsi.period),
        interval_mins = config.cycle_interval_mins,
        "Monitor configured"
    );

    // ── 2. Market data provider & shared state ───────────────────────────
    let provider = Arc::new(YahooClient::new(config.request_timeout())?);
    let state = Arc::new(AppState::new(config, provider.clone()));

    // ── 3. Symbol check & periodic monitor ───────────────────────────────
    if state.config.check_symbols_on_startup {
        let config = state.config.clone();
        tokio::spawn(async move {
            let unlisted = market_data::unlisted_symbols(
                provider.as_ref(),
                &config.symbols,
                &config.daily,
                config.fetch_concurrency,
            )
            .await;
            if unlisted.is_empty() {
                info!(symbols = config.symbols.len(), "all symbols listed");
            } else {
                warn!(
                    count = unlisted.len(),
                    symbols = ?unlisted,
                    "symbols without history, check for delisted or misspelled tickers"
                );
            }
        });
    }

    tokio::spawn(state.monitor.clone().run_periodic());

    // ── 4. API server ────────────────────────────────────────────────────
    let bind_addr =
        std::env::var("BANDWATCH_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.into());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    let app = api::rest::router(state.clone());
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "API server failed");
        }
    });

    // ── 5. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received, stopping");

    if let Some(report) = state.monitor.last_report() {
        info!(
            cycle_id = %report.cycle_id,
            alerts = report.alerts_emitted,
            "last cycle before shutdown"
        );
    }

    info!("bandwatch shut down complete.");
    Ok(())
}

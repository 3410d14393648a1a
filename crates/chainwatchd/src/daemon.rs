//! Daemon wiring — builds the subsystems once and runs them until Ctrl-C.
//!
//! 1. Validate the provider URL (fatal if unusable)
//! 2. Register gauges and collectors
//! 3. Bind the HTTP listener (fatal if the port is taken)
//! 4. Spawn the poll loop
//! 5. Serve `/metrics` and `/health/*` until shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{error, info};

use chainwatch_api::{build_router, ApiState};
use chainwatch_health::ReadinessProbe;
use chainwatch_metrics::{standard_collectors, GaugeRegistry, Poller};
use chainwatch_rpc::{NodeRpc, RpcClient};

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub provider_url: String,
    pub port: u16,
    pub block_gap: bool,
    pub max_remaining_blocks: u64,
    pub rpc_timeout: Duration,
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    info!(
        provider = %config.provider_url,
        block_gap = config.block_gap,
        max_remaining_blocks = config.max_remaining_blocks,
        "chainwatch starting"
    );

    // ── RPC gateway ────────────────────────────────────────────
    let client = RpcClient::with_timeout(&config.provider_url, config.rpc_timeout)
        .with_context(|| format!("cannot use provider {}", config.provider_url))?;
    info!(endpoint = %client.endpoint(), timeout = ?client.timeout(), "rpc gateway configured");
    let rpc: Arc<dyn NodeRpc> = Arc::new(client);

    // ── Gauges + collectors ────────────────────────────────────
    let registry = Arc::new(GaugeRegistry::new());
    let collectors = standard_collectors(&registry, config.block_gap)?;
    let poller = Poller::new(Arc::clone(&rpc), collectors);
    info!(gauges = ?registry.names(), "gauges registered");

    let readiness = ReadinessProbe::new(rpc)
        .with_max_remaining_blocks(config.max_remaining_blocks)
        .with_block_gap(config.block_gap);

    // ── Listener ───────────────────────────────────────────────
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;

    // ── Poll loop ──────────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller_handle = tokio::spawn(async move {
        poller.run(shutdown_rx).await;
    });

    // ── HTTP server ────────────────────────────────────────────
    let router = build_router(ApiState {
        registry,
        readiness,
    });
    info!(%addr, "serving metrics and health endpoints");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "cannot listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    let _ = poller_handle.await;
    info!("chainwatch stopped");
    Ok(())
}

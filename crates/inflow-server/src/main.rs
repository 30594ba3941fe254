// Copyright (C) 2025 Inflow Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Inflow server binary.
//!
//! Wires the embedded transports to the HTTP API: connects the append
//! log and the event bus, starts the sync listener, and serves the
//! ingestion routes until a shutdown signal arrives.

use std::sync::Arc;

use anyhow::Context;
use inflow_core::clients::{Clients, MemoryConnector};
use inflow_core::config::Settings;
use inflow_core::delivery::DeliveryBridge;
use inflow_core::sync::{BroadcastPipeline, SyncListener};
use inflow_server::{AppState, router};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive("inflow=info".parse().unwrap())
                .from_env_lossy(),
        )
        .init();

    let settings = Settings::from_env().map_err(|err| {
        error!(error = %err, "configuration invalid");
        err
    })?;
    info!(instance_id = %settings.instance_id, "starting inflow server");

    // 1. Connect the shared transports up front so a broken environment
    //    fails the boot instead of the first request.
    let clients = Arc::new(Clients::new(settings.clone(), MemoryConnector));
    let store = clients.store().await.context("connecting append log")?;
    let bus = clients.bus().await.context("connecting event bus")?;

    // 2. Assemble the ingestion pipeline.
    let bridge = Arc::new(DeliveryBridge::new(store, settings.delivery_timeout));
    let pipeline = Arc::new(BroadcastPipeline::new(
        settings.instance_id.clone(),
        bus.clone(),
    ));

    // 3. Start replaying peer announcements.
    let shutdown = CancellationToken::new();
    let listener = SyncListener::new(settings.instance_id.clone(), bridge.clone())
        .start(bus, shutdown.clone())
        .await
        .context("starting sync listener")?;

    // 4. Serve the HTTP API.
    let state = AppState::new(settings.clone(), clients.clone(), bridge, pipeline);
    let app = router(state);
    let tcp = tokio::net::TcpListener::bind(settings.http_addr)
        .await
        .with_context(|| format!("binding {}", settings.http_addr))?;
    info!(addr = %settings.http_addr, "listening");

    axum::serve(tcp, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .context("http server")?;

    // 5. Drain the listener and release the transports.
    shutdown.cancel();
    if let Err(err) = listener.await {
        error!(error = %err, "sync listener did not stop cleanly");
    }
    clients.close().await;
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal(token: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_err() {
        error!("shutdown signal handler failed; stopping");
    }
    info!("shutdown signal received");
    token.cancel();
}

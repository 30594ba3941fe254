// Copyright (C) 2025 Inflow Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Application status probe.

use axum::Json;
use axum::extract::State;
use inflow_core::transport::{AppendTransport, EventBus};
use serde::Serialize;

use crate::state::AppState;

const AVAILABLE: &str = "AVAILABLE";
const UNAVAILABLE: &str = "UNAVAILABLE";

/// Availability snapshot returned by `GET /status`.
#[derive(Debug, Serialize)]
pub(crate) struct StatusResponse {
    application: &'static str,
    application_version: &'static str,
    store_status: &'static str,
    bus_status: &'static str,
    elapsed_time: f64,
}

/// `GET /status`: report transport availability and server uptime.
pub(crate) async fn read_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let store_status = match state.clients.store().await {
        Ok(store) if store.is_reachable() => AVAILABLE,
        _ => UNAVAILABLE,
    };
    let bus_status = match state.clients.bus().await {
        Ok(bus) if bus.is_reachable() => AVAILABLE,
        _ => UNAVAILABLE,
    };
    Json(StatusResponse {
        application: env!("CARGO_PKG_NAME"),
        application_version: env!("CARGO_PKG_VERSION"),
        store_status,
        bus_status,
        elapsed_time: state.started.elapsed().as_secs_f64(),
    })
}

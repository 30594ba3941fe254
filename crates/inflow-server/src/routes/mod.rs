// Copyright (C) 2025 Inflow Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP route handlers.

mod data;
mod status;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the API router over the shared state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/data", post(data::ingest_data).get(data::fetch_data))
        .route("/status", get(status::read_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

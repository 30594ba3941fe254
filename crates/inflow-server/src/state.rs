// Copyright (C) 2025 Inflow Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared application state handed to every route handler.

use std::sync::Arc;
use std::time::Instant;

use inflow_core::clients::Clients;
use inflow_core::config::Settings;
use inflow_core::delivery::DeliveryBridge;
use inflow_core::workflow::PipelineStages;

/// State cloned into each request handler.
#[derive(Clone)]
pub struct AppState {
    /// Settings the server was started with.
    pub settings: Settings,
    /// Shared transport clients.
    pub clients: Arc<Clients>,
    /// Bridge used to persist inbound records.
    pub bridge: Arc<DeliveryBridge>,
    /// Pipeline hooked into every ingestion workflow.
    pub pipeline: Arc<dyn PipelineStages>,
    /// When the server started serving.
    pub started: Instant,
}

impl AppState {
    /// Bundle the shared components for the router.
    pub fn new(
        settings: Settings,
        clients: Arc<Clients>,
        bridge: Arc<DeliveryBridge>,
        pipeline: Arc<dyn PipelineStages>,
    ) -> Self {
        Self {
            settings,
            clients,
            bridge,
            pipeline,
            started: Instant::now(),
        }
    }
}

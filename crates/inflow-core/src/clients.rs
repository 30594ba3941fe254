// Copyright (C) 2025 Inflow Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared transport clients.
//!
//! [`Clients`] owns the process-wide append-log and event-bus handles.
//! Connections are established lazily on first use and then shared; a
//! failed connection attempt is not cached, so the next caller retries.
//! How connections are made is the [`TransportConnector`]'s business,
//! which keeps embedded and clustered deployments behind one type.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::Settings;
use crate::error::TransportError;
use crate::transport::{AppendTransport, EventBus, MemoryBus, MemoryLog};

/// Establishes transport connections for a deployment flavor.
#[async_trait]
pub trait TransportConnector: Send + Sync {
    /// Connect the append log.
    async fn connect_store(
        &self,
        settings: &Settings,
    ) -> Result<Arc<dyn AppendTransport>, TransportError>;

    /// Connect the event bus.
    async fn connect_bus(&self, settings: &Settings) -> Result<Arc<dyn EventBus>, TransportError>;
}

/// Connector for embedded deployments; everything stays in-process.
pub struct MemoryConnector;

#[async_trait]
impl TransportConnector for MemoryConnector {
    async fn connect_store(
        &self,
        settings: &Settings,
    ) -> Result<Arc<dyn AppendTransport>, TransportError> {
        Ok(Arc::new(MemoryLog::new(settings.store_partitions)))
    }

    async fn connect_bus(&self, _settings: &Settings) -> Result<Arc<dyn EventBus>, TransportError> {
        Ok(Arc::new(MemoryBus::new()))
    }
}

/// Lazily connected, process-wide transport handles.
pub struct Clients {
    settings: Settings,
    connector: Box<dyn TransportConnector>,
    store: OnceCell<Arc<dyn AppendTransport>>,
    bus: OnceCell<Arc<dyn EventBus>>,
}

impl Clients {
    /// Create the client set; nothing connects until first use.
    pub fn new<C>(settings: Settings, connector: C) -> Self
    where
        C: TransportConnector + 'static,
    {
        Self {
            settings,
            connector: Box::new(connector),
            store: OnceCell::new(),
            bus: OnceCell::new(),
        }
    }

    /// The shared append log, connecting it on first call.
    pub async fn store(&self) -> Result<Arc<dyn AppendTransport>, TransportError> {
        let store = self
            .store
            .get_or_try_init(|| async {
                let store = self.connector.connect_store(&self.settings).await?;
                info!(
                    partitions = self.settings.store_partitions,
                    "store transport connected"
                );
                Ok(store)
            })
            .await?;
        Ok(store.clone())
    }

    /// The shared event bus, connecting it on first call.
    pub async fn bus(&self) -> Result<Arc<dyn EventBus>, TransportError> {
        let bus = self
            .bus
            .get_or_try_init(|| async {
                let bus = self.connector.connect_bus(&self.settings).await?;
                info!("bus transport connected");
                Ok(bus)
            })
            .await?;
        Ok(bus.clone())
    }

    /// Close whichever transports were connected.
    pub async fn close(&self) {
        if let Some(store) = self.store.get() {
            store.close().await;
        }
        if let Some(bus) = self.bus.get() {
            bus.close().await;
        }
        info!("transports closed");
    }
}

// Copyright (C) 2025 Inflow Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Cross-instance synchronization.
//!
//! Instances announce every confirmed record on the sync subject and
//! listen for announcements from their peers. A peer's announcement is
//! forwarded byte-for-byte into the replay category of the local log;
//! an instance's own announcement comes back around and is dropped by
//! instance id. Delivery is at-least-once, so a replayed record may be
//! appended more than once; replay consumers deduplicate by record id.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::{ERROR_SUBJECT, REPLAY_CATEGORY, SYNC_SUBJECT};
use crate::delivery::DeliveryBridge;
use crate::error::{SyncError, TransportError, WorkflowError};
use crate::events::{ErrorEvent, SyncEvent};
use crate::record::DataRecord;
use crate::transport::EventBus;
use crate::workflow::PipelineStages;

/// What the listener did with one sync event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The event came from this instance and was dropped.
    LocalEcho,
    /// The event came from a peer and was appended to the replay log.
    Replayed {
        /// Where the replayed record landed.
        location: String,
    },
}

/// Listens for peer announcements and replays them into the local log.
pub struct SyncListener {
    instance_id: String,
    bridge: Arc<DeliveryBridge>,
}

impl SyncListener {
    /// Create a listener that drops events carrying `instance_id`.
    pub fn new(instance_id: impl Into<String>, bridge: Arc<DeliveryBridge>) -> Self {
        Self {
            instance_id: instance_id.into(),
            bridge,
        }
    }

    /// Subscribe to the sync subject and process events until shutdown.
    ///
    /// Failing events are logged and skipped; only cancellation or the
    /// bus closing ends the loop.
    pub async fn start(
        self,
        bus: Arc<dyn EventBus>,
        shutdown: CancellationToken,
    ) -> Result<JoinHandle<()>, TransportError> {
        let mut subscription = bus.subscribe(SYNC_SUBJECT).await?;
        info!(instance_id = %self.instance_id, subject = SYNC_SUBJECT, "sync listener started");
        Ok(tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => {
                        info!("sync listener stopping");
                        break;
                    }
                    message = subscription.recv() => {
                        let Some(message) = message else {
                            info!("sync subscription closed");
                            break;
                        };
                        match self.process_event(&message.payload).await {
                            Ok(SyncOutcome::LocalEcho) => {
                                debug!("dropped local echo");
                            }
                            Ok(SyncOutcome::Replayed { location }) => {
                                info!(%location, "peer record replayed");
                            }
                            Err(error) => {
                                warn!(error = %error, "sync event not processed");
                            }
                        }
                    }
                }
            }
        }))
    }

    /// Decide what to do with one raw sync event payload.
    ///
    /// Peer events are forwarded verbatim, so the replay log holds the
    /// exact bytes that crossed the bus.
    #[instrument(skip(self, payload), fields(instance_id = %self.instance_id))]
    pub async fn process_event(&self, payload: &[u8]) -> Result<SyncOutcome, SyncError> {
        let event: SyncEvent = serde_json::from_slice(payload)?;
        if event.instance_id == self.instance_id {
            return Ok(SyncOutcome::LocalEcho);
        }
        let delivery = self
            .bridge
            .append(REPLAY_CATEGORY, payload.to_vec())
            .await
            .map_err(|source| SyncError::Forward {
                category: REPLAY_CATEGORY.to_string(),
                source,
            })?;
        Ok(SyncOutcome::Replayed {
            location: delivery.location,
        })
    }
}

/// Pipeline that announces confirmed records and failures on the bus.
pub struct BroadcastPipeline {
    instance_id: String,
    bus: Arc<dyn EventBus>,
}

impl BroadcastPipeline {
    /// Create a pipeline announcing under `instance_id`.
    pub fn new(instance_id: impl Into<String>, bus: Arc<dyn EventBus>) -> Self {
        Self {
            instance_id: instance_id.into(),
            bus,
        }
    }
}

#[async_trait]
impl PipelineStages for BroadcastPipeline {
    async fn synchronize(&self, record: &DataRecord) -> Result<(), WorkflowError> {
        let event = SyncEvent::new(self.instance_id.clone(), record.clone());
        let payload = serde_json::to_vec(&event)?;
        self.bus
            .publish(SYNC_SUBJECT, payload)
            .await
            .map_err(|source| WorkflowError::Publish {
                subject: SYNC_SUBJECT.to_string(),
                source,
            })?;
        debug!(id = %record.record.id, "record announced");
        Ok(())
    }

    async fn on_error(&self, error: &WorkflowError) -> Result<(), WorkflowError> {
        let event = ErrorEvent::new(self.instance_id.clone(), error.to_string());
        let payload = serde_json::to_vec(&event)?;
        self.bus
            .publish(ERROR_SUBJECT, payload)
            .await
            .map_err(|source| WorkflowError::Publish {
                subject: ERROR_SUBJECT.to_string(),
                source,
            })?;
        Ok(())
    }
}

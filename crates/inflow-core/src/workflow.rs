// Copyright (C) 2025 Inflow Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Record ingestion workflow.
//!
//! Every inbound record moves through a fixed state machine:
//!
//! | Transition    | Allowed from                 | Lands in   |
//! |---------------|------------------------------|------------|
//! | `validate`    | parse                        | validate   |
//! | `transform`   | validate                     | transform  |
//! | `persist`     | parse, validate, transform   | persist    |
//! | `transmit`    | persist                      | transmit   |
//! | `synchronize` | persist, transmit            | sync       |
//! | `handle_error`| any state except error       | error      |
//!
//! Each stage checks the transition guard first, then runs its side
//! effect, then advances. A failed side effect leaves the state where it
//! was, so a record can never claim a stage it did not complete.
//! Deployment-specific behavior hangs off the [`PipelineStages`] trait;
//! the state machine itself never changes shape.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::delivery::DeliveryBridge;
use crate::error::WorkflowError;
use crate::record::{DataRecord, InboundRecord, StoredRecord};

/// Position of a record in the ingestion workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    /// Freshly received, nothing checked yet.
    Parse,
    /// Passed validation.
    Validate,
    /// Reshaped for storage.
    Transform,
    /// Appended to the log and confirmed.
    Persist,
    /// Handed to the downstream consumer.
    Transmit,
    /// Announced to peer instances.
    Sync,
    /// Terminal failure state.
    Error,
}

impl WorkflowState {
    /// Whether `transition` may fire from this state.
    pub fn permits(self, transition: Transition) -> bool {
        transition.sources().contains(&self)
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parse => "parse",
            Self::Validate => "validate",
            Self::Transform => "transform",
            Self::Persist => "persist",
            Self::Transmit => "transmit",
            Self::Sync => "sync",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// A named edge of the workflow state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Check the inbound record.
    Validate,
    /// Reshape the inbound record.
    Transform,
    /// Append to the log and await confirmation.
    Persist,
    /// Hand the confirmed record downstream.
    Transmit,
    /// Announce the confirmed record to peers.
    Synchronize,
    /// Enter the terminal error state.
    HandleError,
}

impl Transition {
    /// States this transition may fire from.
    pub const fn sources(self) -> &'static [WorkflowState] {
        match self {
            Self::Validate => &[WorkflowState::Parse],
            Self::Transform => &[WorkflowState::Validate],
            Self::Persist => &[
                WorkflowState::Parse,
                WorkflowState::Validate,
                WorkflowState::Transform,
            ],
            Self::Transmit => &[WorkflowState::Persist],
            Self::Synchronize => &[WorkflowState::Persist, WorkflowState::Transmit],
            Self::HandleError => &[
                WorkflowState::Parse,
                WorkflowState::Validate,
                WorkflowState::Transform,
                WorkflowState::Persist,
                WorkflowState::Transmit,
                WorkflowState::Sync,
            ],
        }
    }

    /// State this transition lands in.
    pub const fn target(self) -> WorkflowState {
        match self {
            Self::Validate => WorkflowState::Validate,
            Self::Transform => WorkflowState::Transform,
            Self::Persist => WorkflowState::Persist,
            Self::Transmit => WorkflowState::Transmit,
            Self::Synchronize => WorkflowState::Sync,
            Self::HandleError => WorkflowState::Error,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validate => "validate",
            Self::Transform => "transform",
            Self::Persist => "persist",
            Self::Transmit => "transmit",
            Self::Synchronize => "synchronize",
            Self::HandleError => "handle_error",
        };
        f.write_str(name)
    }
}

/// Deployment-specific behavior hooked into the workflow stages.
///
/// Every hook defaults to a no-op, so a pipeline only overrides the
/// stages it cares about. Hooks run between the stage guard and the
/// state advance; a hook error aborts the stage without moving.
#[async_trait]
pub trait PipelineStages: Send + Sync {
    /// Check the inbound record before it is accepted.
    async fn validate(&self, _record: &mut InboundRecord) -> Result<(), WorkflowError> {
        Ok(())
    }

    /// Reshape the inbound record before storage.
    async fn transform(&self, _record: &mut InboundRecord) -> Result<(), WorkflowError> {
        Ok(())
    }

    /// Hand the confirmed record to a downstream consumer.
    async fn transmit(&self, _record: &DataRecord) -> Result<(), WorkflowError> {
        Ok(())
    }

    /// Announce the confirmed record to peer instances.
    async fn synchronize(&self, _record: &DataRecord) -> Result<(), WorkflowError> {
        Ok(())
    }

    /// Observe a workflow failure on the way into the error state.
    async fn on_error(&self, _error: &WorkflowError) -> Result<(), WorkflowError> {
        Ok(())
    }
}

/// Pipeline with every hook left at its no-op default.
pub struct DefaultPipeline;

#[async_trait]
impl PipelineStages for DefaultPipeline {}

/// State machine driving one inbound record from parse to sync.
pub struct RecordWorkflow {
    inbound: InboundRecord,
    state: WorkflowState,
    bridge: Arc<DeliveryBridge>,
    pipeline: Arc<dyn PipelineStages>,
    cancel: CancellationToken,
    started: Instant,
}

impl RecordWorkflow {
    /// Start a workflow for `inbound` in the parse state.
    pub fn new(
        inbound: InboundRecord,
        bridge: Arc<DeliveryBridge>,
        pipeline: Arc<dyn PipelineStages>,
    ) -> Self {
        Self {
            inbound,
            state: WorkflowState::Parse,
            bridge,
            pipeline,
            cancel: CancellationToken::new(),
            started: Instant::now(),
        }
    }

    /// Attach a cancellation token; a cancelled token aborts the run.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Current position in the state machine.
    pub fn state(&self) -> WorkflowState {
        self.state
    }

    fn guard(&self, transition: Transition) -> Result<(), WorkflowError> {
        if self.state.permits(transition) {
            Ok(())
        } else {
            Err(WorkflowError::IllegalTransition {
                transition,
                from: self.state,
            })
        }
    }

    fn advance(&mut self, transition: Transition) {
        debug!(from = %self.state, to = %transition.target(), "transition");
        self.state = transition.target();
    }

    fn ensure_active(&self) -> Result<(), WorkflowError> {
        if self.cancel.is_cancelled() {
            return Err(WorkflowError::Cancelled);
        }
        Ok(())
    }

    /// Run the validation stage.
    pub async fn validate(&mut self) -> Result<(), WorkflowError> {
        self.guard(Transition::Validate)?;
        let pipeline = self.pipeline.clone();
        pipeline.validate(&mut self.inbound).await?;
        self.advance(Transition::Validate);
        Ok(())
    }

    /// Run the transformation stage.
    pub async fn transform(&mut self) -> Result<(), WorkflowError> {
        self.guard(Transition::Transform)?;
        let pipeline = self.pipeline.clone();
        pipeline.transform(&mut self.inbound).await?;
        self.advance(Transition::Transform);
        Ok(())
    }

    /// Append the record to the log and wait for confirmation.
    ///
    /// On confirmation the inbound record is frozen into a [`DataRecord`]
    /// carrying the storage location and the elapsed timings.
    pub async fn persist(&mut self) -> Result<DataRecord, WorkflowError> {
        self.guard(Transition::Persist)?;
        let payload = serde_json::to_string(&self.inbound.payload)?;
        let category = self.inbound.category().to_string();
        let record = StoredRecord {
            id: Uuid::new_v4(),
            created_at: Utc::now().trunc_subsecs(0),
            origin_url: self.inbound.origin_url.clone(),
            data_format: category.clone(),
            payload,
        };
        let bytes = serde_json::to_vec(&record)?;
        let delivery = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(WorkflowError::Cancelled),
            result = self.bridge.append(&category, bytes) => result?,
        };
        info!(
            id = %record.id,
            location = %delivery.location,
            "record persisted"
        );
        let confirmed = DataRecord::confirmed(
            record,
            delivery.location,
            delivery.elapsed.as_secs_f64(),
            self.started.elapsed().as_secs_f64(),
        );
        self.advance(Transition::Persist);
        Ok(confirmed)
    }

    /// Run the transmission stage for a confirmed record.
    pub async fn transmit(&mut self, record: &DataRecord) -> Result<(), WorkflowError> {
        self.guard(Transition::Transmit)?;
        let pipeline = self.pipeline.clone();
        pipeline.transmit(record).await?;
        self.advance(Transition::Transmit);
        Ok(())
    }

    /// Run the synchronization stage for a confirmed record.
    pub async fn synchronize(&mut self, record: &DataRecord) -> Result<(), WorkflowError> {
        self.guard(Transition::Synchronize)?;
        let pipeline = self.pipeline.clone();
        pipeline.synchronize(record).await?;
        self.advance(Transition::Synchronize);
        Ok(())
    }

    /// Enter the terminal error state.
    ///
    /// The pipeline's error hook runs on the way in; a failing hook is
    /// logged and does not keep the workflow out of the error state.
    pub async fn handle_error(&mut self, error: &WorkflowError) -> Result<(), WorkflowError> {
        self.guard(Transition::HandleError)?;
        let pipeline = self.pipeline.clone();
        if let Err(hook) = pipeline.on_error(error).await {
            warn!(error = %hook, "error hook failed");
        }
        self.advance(Transition::HandleError);
        Ok(())
    }

    /// Drive the record through every remaining stage up to sync.
    ///
    /// Validation and transformation run only while the state still
    /// permits them, so a run picks up after stages already driven by
    /// hand; persistence is never skipped. On failure the workflow
    /// enters the error state and the original error is returned.
    #[instrument(skip(self), fields(origin = %self.inbound.origin_url, state = %self.state))]
    pub async fn run(&mut self) -> Result<DataRecord, WorkflowError> {
        match self.advance_all().await {
            Ok(record) => Ok(record),
            Err(error) => {
                if self.state.permits(Transition::HandleError) {
                    if let Err(inner) = self.handle_error(&error).await {
                        warn!(error = %inner, "could not enter error state");
                    }
                }
                Err(error)
            }
        }
    }

    async fn advance_all(&mut self) -> Result<DataRecord, WorkflowError> {
        self.ensure_active()?;
        if self.state.permits(Transition::Validate) {
            self.validate().await?;
        }
        if self.state.permits(Transition::Transform) {
            self.transform().await?;
        }
        self.ensure_active()?;
        let record = self.persist().await?;
        if self.state.permits(Transition::Transmit) {
            self.transmit(&record).await?;
        }
        if self.state.permits(Transition::Synchronize) {
            self.synchronize(&record).await?;
        }
        Ok(record)
    }
}

/// Run a fresh workflow for `inbound` to completion.
pub async fn run_workflow(
    inbound: InboundRecord,
    bridge: Arc<DeliveryBridge>,
    pipeline: Arc<dyn PipelineStages>,
) -> Result<DataRecord, WorkflowError> {
    let mut workflow = RecordWorkflow::new(inbound, bridge, pipeline);
    workflow.run().await
}

// Copyright (C) 2025 Inflow Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for workflow execution, storage, and sync.

use std::time::Duration;

use thiserror::Error;

use crate::workflow::{Transition, WorkflowState};

/// Errors raised by the transport layer (append log and event bus).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The transport rejected the operation.
    #[error("transport unavailable: {reason}")]
    Unavailable {
        /// Reason reported by the transport.
        reason: String,
    },

    /// The transport has been closed.
    #[error("transport closed")]
    Closed,
}

/// Errors raised while appending a record to the durable store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The transport or broker reported a delivery failure.
    #[error("append to '{category}' was not confirmed: {source}")]
    Delivery {
        /// Category the append targeted.
        category: String,
        /// The underlying transport failure.
        source: TransportError,
    },

    /// No delivery confirmation arrived within the configured bound.
    #[error("no delivery confirmation for '{category}' within {waited:?}")]
    ConfirmationTimeout {
        /// Category the append targeted.
        category: String,
        /// How long the bridge waited.
        waited: Duration,
    },

    /// The transport dropped the delivery callback without invoking it.
    #[error("delivery confirmation for '{category}' was dropped before completion")]
    ConfirmationDropped {
        /// Category the append targeted.
        category: String,
    },
}

/// Errors raised while driving a record workflow.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A transition was attempted from a state the table does not permit.
    #[error("illegal transition '{transition}' from state '{from}'")]
    IllegalTransition {
        /// The transition that was attempted.
        transition: Transition,
        /// The state the workflow was in.
        from: WorkflowState,
    },

    /// A pipeline stage rejected the record.
    #[error("validation failed: {reason}")]
    Validation {
        /// Why the record was rejected.
        reason: String,
    },

    /// The record could not be serialized to its wire form.
    #[error("record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The durable append failed.
    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),

    /// A bus publish performed by a pipeline stage failed.
    #[error("publish to '{subject}' failed: {source}")]
    Publish {
        /// Subject the publish targeted.
        subject: String,
        /// The underlying transport failure.
        source: TransportError,
    },

    /// The workflow was cancelled before completing.
    #[error("workflow cancelled")]
    Cancelled,
}

/// Errors raised while processing a sync event from a peer instance.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The event payload was not a decodable sync event.
    #[error("sync event decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    /// Forwarding the peer record into the local log failed.
    #[error("replay into '{category}' failed: {source}")]
    Forward {
        /// Category the forward targeted.
        category: String,
        /// The underlying storage failure.
        source: StorageError,
    },
}

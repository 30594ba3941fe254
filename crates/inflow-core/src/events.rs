// Copyright (C) 2025 Inflow Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Event shapes published on the bus.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::record::DataRecord;

/// A stored record broadcast to peer instances on the sync subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncEvent {
    /// Identity of the instance that stored the record.
    pub instance_id: String,
    /// The confirmed record.
    #[serde(flatten)]
    pub record: DataRecord,
}

impl SyncEvent {
    /// Build a sync event for a record stored by `instance_id`.
    pub fn new(instance_id: impl Into<String>, record: DataRecord) -> Self {
        Self {
            instance_id: instance_id.into(),
            record,
        }
    }
}

/// A workflow failure published on the error subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEvent {
    /// Identity of the instance that observed the failure.
    pub instance_id: String,
    /// Rendered error.
    pub error: String,
    /// When the failure was observed, whole-second precision.
    pub occurred_at: DateTime<Utc>,
}

impl ErrorEvent {
    /// Build an error event with the current timestamp.
    pub fn new(instance_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            error: error.into(),
            occurred_at: Utc::now().trunc_subsecs(0),
        }
    }
}

/// An elapsed-time measurement published on the timing subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingEvent {
    /// Name of the measured function.
    pub function: String,
    /// Elapsed wall time in seconds.
    pub elapsed_seconds: f64,
}

impl TimingEvent {
    /// Build a timing event.
    pub fn new(function: impl Into<String>, elapsed_seconds: f64) -> Self {
        Self {
            function: function.into(),
            elapsed_seconds,
        }
    }
}

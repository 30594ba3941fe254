// Copyright (C) 2025 Inflow Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Inbound and durable record models.
//!
//! An [`InboundRecord`] is what an adapter admits into the workflow. The
//! persist stage turns it into a [`StoredRecord`] (the wire form appended to
//! the log) and, once the append is confirmed, a [`DataRecord`] carrying the
//! storage location and timings. The persist stage builds confirmed records
//! through [`DataRecord::confirmed`], which attaches `location` and
//! `stored_at` together with a success `status`. The fields stay plain data
//! because records also arrive decoded off the bus, where the confirmation
//! fields may be absent.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::DEFAULT_CATEGORY;

/// Delivery status of a durable record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// The record was appended and confirmed.
    Success,
    /// The record failed before confirmation.
    Error,
}

/// A record admitted by an adapter, before persistence.
#[derive(Debug, Clone)]
pub struct InboundRecord {
    /// Arbitrary JSON payload.
    pub payload: Value,
    /// The consuming endpoint the record arrived on.
    pub origin_url: String,
    /// Log category; [`DEFAULT_CATEGORY`] when unset.
    pub data_format: Option<String>,
}

impl InboundRecord {
    /// Create an inbound record with no explicit data format.
    pub fn new(payload: Value, origin_url: impl Into<String>) -> Self {
        Self {
            payload,
            origin_url: origin_url.into(),
            data_format: None,
        }
    }

    /// Set the data format (the log category the record persists under).
    pub fn with_data_format(mut self, data_format: impl Into<String>) -> Self {
        self.data_format = Some(data_format.into());
        self
    }

    /// The log category this record persists under.
    pub fn category(&self) -> &str {
        self.data_format.as_deref().unwrap_or(DEFAULT_CATEGORY)
    }
}

/// Wire form of a durable record, as appended to the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Unique record identifier, assigned at persist.
    pub id: Uuid,
    /// When the record entered the workflow, whole-second precision.
    pub created_at: DateTime<Utc>,
    /// The consuming endpoint the record arrived on.
    pub origin_url: String,
    /// Log category the record was appended under.
    pub data_format: String,
    /// Serialized form of the inbound payload.
    pub payload: String,
}

/// A durable record with its delivery confirmation attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataRecord {
    /// The wire form that was appended.
    #[serde(flatten)]
    pub record: StoredRecord,
    /// When the append was confirmed, whole-second precision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_at: Option<DateTime<Utc>>,
    /// Storage location as `category:partition:offset`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Delivery status.
    pub status: RecordStatus,
    /// Append round-trip in seconds.
    pub elapsed_storage_time: f64,
    /// Workflow start to persist completion in seconds.
    pub elapsed_total_time: f64,
}

impl DataRecord {
    /// Build the confirmed record for a successful append.
    ///
    /// Sets `status` to success, stamps `stored_at`, and attaches the
    /// delivery location, keeping the success invariant by construction.
    pub fn confirmed(
        record: StoredRecord,
        location: String,
        elapsed_storage_time: f64,
        elapsed_total_time: f64,
    ) -> Self {
        Self {
            record,
            stored_at: Some(Utc::now().trunc_subsecs(0)),
            location: Some(location),
            status: RecordStatus::Success,
            elapsed_storage_time,
            elapsed_total_time,
        }
    }
}

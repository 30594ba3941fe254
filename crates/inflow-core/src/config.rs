// Copyright (C) 2025 Inflow Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration loading from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use uuid::Uuid;

/// Bus subject carrying sync events between instances.
pub const SYNC_SUBJECT: &str = "events.sync";

/// Bus subject carrying timing events from the instrumentation wrapper.
pub const TIMING_SUBJECT: &str = "events.timing";

/// Bus subject carrying workflow error events.
pub const ERROR_SUBJECT: &str = "events.error";

/// Log category that peer records are replayed into.
pub const REPLAY_CATEGORY: &str = "replay";

/// Log category used when an inbound record carries no data format.
pub const DEFAULT_CATEGORY: &str = "default";

/// Inflow configuration
#[derive(Debug, Clone)]
pub struct Settings {
    /// Identity of this instance, compared against sync events to drop local echoes
    pub instance_id: String,
    /// HTTP API bind address
    pub http_addr: SocketAddr,
    /// Upper bound on a single append confirmation wait
    pub delivery_timeout: Duration,
    /// Partitions per category in the embedded append log
    pub store_partitions: u32,
}

impl Settings {
    /// Load configuration from environment variables.
    ///
    /// All variables are optional:
    /// - `INFLOW_INSTANCE_ID`: instance identity (default: random UUID v4)
    /// - `INFLOW_HTTP_PORT`: HTTP API port (default: 8080)
    /// - `INFLOW_DELIVERY_TIMEOUT_MS`: append confirmation bound (default: 30000)
    /// - `INFLOW_STORE_PARTITIONS`: partitions per category (default: 1)
    pub fn from_env() -> Result<Self, ConfigError> {
        let instance_id = std::env::var("INFLOW_INSTANCE_ID")
            .unwrap_or_else(|_| Uuid::new_v4().to_string());

        let http_port: u16 = std::env::var("INFLOW_HTTP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("INFLOW_HTTP_PORT", "must be a valid port number"))?;

        let delivery_timeout_ms: u64 = std::env::var("INFLOW_DELIVERY_TIMEOUT_MS")
            .unwrap_or_else(|_| "30000".to_string())
            .parse()
            .map_err(|_| {
                ConfigError::Invalid(
                    "INFLOW_DELIVERY_TIMEOUT_MS",
                    "must be a duration in milliseconds",
                )
            })?;

        let store_partitions: u32 = std::env::var("INFLOW_STORE_PARTITIONS")
            .unwrap_or_else(|_| "1".to_string())
            .parse()
            .map_err(|_| {
                ConfigError::Invalid("INFLOW_STORE_PARTITIONS", "must be a positive integer")
            })?;
        if store_partitions == 0 {
            return Err(ConfigError::Invalid(
                "INFLOW_STORE_PARTITIONS",
                "must be at least 1",
            ));
        }

        Ok(Self {
            instance_id,
            http_addr: SocketAddr::from(([0, 0, 0, 0], http_port)),
            delivery_timeout: Duration::from_millis(delivery_timeout_ms),
            store_partitions,
        })
    }

    /// Settings for an embedded, single-process deployment.
    ///
    /// Binds the HTTP API to an ephemeral localhost port and keeps the
    /// default confirmation bound.
    pub fn local(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            http_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            delivery_timeout: Duration::from_millis(30_000),
            store_partitions: 1,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}

// Copyright (C) 2025 Inflow Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Inflow Core - Record Ingestion Engine
//!
//! This crate drives inbound data records through a workflow state machine,
//! persists them to a partitioned append log, and replays records arriving
//! from peer instances so every instance converges on the same log contents.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        HTTP Adapters                              │
//! │                      (inflow-server)                              │
//! └──────────────────────────────────────────────────────────────────┘
//!                │ run_workflow(payload, origin)
//!                ▼
//! ┌───────────────────────┐      append       ┌───────────────────────┐
//! │   Record Workflow     │──────────────────►│  Delivery Bridge      │
//! │  (state machine,      │   location +      │  (callback produce →  │
//! │   one per record)     │◄──────────────────│   awaitable confirm)  │
//! └───────────┬───────────┘      elapsed      └───────────┬───────────┘
//!             │ synchronize                               │ produce
//!             ▼                                           ▼
//! ┌───────────────────────┐                   ┌───────────────────────┐
//! │      Event Bus        │                   │     Append Log        │
//! │  (sync/timing/error   │                   │  (category:partition: │
//! │      subjects)        │                   │       offset)         │
//! └───────────┬───────────┘                   └───────────────────────┘
//!             │ events.sync                               ▲
//!             ▼                                           │ replay
//! ┌───────────────────────┐                               │
//! │    Sync Listener      │───────────────────────────────┘
//! │  (dedup by instance,  │
//! │   forward peers)      │
//! └───────────────────────┘
//! ```
//!
//! # Workflow State Machine
//!
//! ```text
//!   ┌───────┐ validate ┌──────────┐ transform ┌───────────┐
//!   │ PARSE │─────────►│ VALIDATE │──────────►│ TRANSFORM │
//!   └───┬───┘          └────┬─────┘           └─────┬─────┘
//!       │                   │                       │
//!       └───────────────────┴─────────┬─────────────┘
//!                                     │ persist
//!                                     ▼
//!                               ┌─────────┐ transmit ┌──────────┐
//!                               │ PERSIST │─────────►│ TRANSMIT │
//!                               └────┬────┘          └────┬─────┘
//!                                    │ synchronize        │
//!                                    └─────────┬──────────┘
//!                                              ▼
//!                                          ┌──────┐
//!                                          │ SYNC │
//!                                          └──────┘
//!
//!   Any non-error state ──handle_error──► ERROR
//! ```
//!
//! A transition fires only when the table permits it from the current state;
//! an illegal transition fails without touching the record or the state.
//!
//! # Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `INFLOW_INSTANCE_ID` | No | random UUID | Identity used to discard local sync echoes |
//! | `INFLOW_HTTP_PORT` | No | `8080` | HTTP API port |
//! | `INFLOW_DELIVERY_TIMEOUT_MS` | No | `30000` | Upper bound on append confirmation waits |
//! | `INFLOW_STORE_PARTITIONS` | No | `1` | Partitions per category in the embedded log |
//!
//! # Modules
//!
//! - [`clients`]: Lazily connected, process-wide transport handles
//! - [`config`]: Settings from environment variables, subjects and categories
//! - [`delivery`]: Delivery-confirmation bridge over the append transport
//! - [`error`]: Error types for workflow, storage, and sync failures
//! - [`events`]: Bus event shapes (sync, timing, error)
//! - [`record`]: Inbound and durable record models
//! - [`sync`]: Cross-instance sync listener and broadcast pipeline
//! - [`timing`]: Elapsed-time instrumentation wrapper
//! - [`transport`]: Append log and event bus seams with embedded backends
//! - [`workflow`]: Record workflow state machine and run driver

#![deny(missing_docs)]

/// Lazily connected transport clients shared across the process.
pub mod clients;

/// Settings from environment variables plus fixed subjects and categories.
pub mod config;

/// Delivery-confirmation bridge turning callback produces into awaitable appends.
pub mod delivery;

/// Error types for workflow, storage, transport, and sync failures.
pub mod error;

/// Event shapes published on the bus (sync, timing, error).
pub mod events;

/// Inbound and durable record models.
pub mod record;

/// Sync listener (peer replay) and the broadcasting pipeline.
pub mod sync;

/// Elapsed-time instrumentation around async calls.
pub mod timing;

/// Append log and event bus abstractions with embedded implementations.
pub mod transport;

/// Record workflow state machine, pipeline stages, and the run driver.
pub mod workflow;

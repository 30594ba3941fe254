// Copyright (C) 2025 Inflow Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Transport interfaces and embedded backends.
//!
//! This module defines the append-log and event-bus abstractions and the
//! in-process implementations used for embedded deployments.

pub mod memory;

pub use self::memory::{MemoryBus, MemoryLog};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::error::TransportError;

/// Coordinates of a confirmed append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// Category the record was appended under.
    pub category: String,
    /// Partition within the category.
    pub partition: u32,
    /// Offset within the partition.
    pub offset: u64,
}

impl DeliveryReceipt {
    /// Render the receipt as a `category:partition:offset` location.
    pub fn location(&self) -> String {
        format!("{}:{}:{}", self.category, self.partition, self.offset)
    }
}

/// Callback invoked exactly once with the outcome of a produce call.
pub type DeliveryCallback =
    Box<dyn FnOnce(Result<DeliveryReceipt, TransportError>) + Send + 'static>;

/// A stored entry read back from the append log.
#[derive(Debug, Clone)]
pub struct FetchedEntry {
    /// The appended bytes.
    pub payload: Vec<u8>,
    /// When the entry was appended, whole-second precision.
    pub appended_at: DateTime<Utc>,
}

/// A message delivered to a bus subscription.
#[derive(Debug, Clone)]
pub struct BusMessage {
    /// Subject the message was published on.
    pub subject: String,
    /// Raw message payload.
    pub payload: Vec<u8>,
}

/// A standing subscription to a bus subject.
#[derive(Debug)]
pub struct Subscription {
    pub(crate) rx: mpsc::UnboundedReceiver<BusMessage>,
}

impl Subscription {
    /// Receive the next message, or `None` once the bus is closed.
    pub async fn recv(&mut self) -> Option<BusMessage> {
        self.rx.recv().await
    }
}

/// Durable, partitioned, offset-indexed append log.
///
/// Produces are fire-and-forget: the outcome arrives through the
/// `on_delivery` callback, which the transport invokes exactly once. The
/// delivery bridge adapts this into an awaitable call.
#[async_trait]
pub trait AppendTransport: Send + Sync {
    /// Append `payload` under `category`; report the outcome via `on_delivery`.
    async fn produce(
        &self,
        category: &str,
        payload: Vec<u8>,
        on_delivery: DeliveryCallback,
    ) -> Result<(), TransportError>;

    /// Read back the entry at the given coordinates, if it exists.
    async fn fetch(
        &self,
        category: &str,
        partition: u32,
        offset: u64,
    ) -> Result<Option<FetchedEntry>, TransportError>;

    /// Whether the transport currently accepts operations.
    fn is_reachable(&self) -> bool;

    /// Release the transport; subsequent operations fail.
    async fn close(&self);
}

/// Subject-based publish/subscribe bus.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish `payload` to every subscriber of `subject`.
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), TransportError>;

    /// Open a standing subscription to `subject`.
    async fn subscribe(&self, subject: &str) -> Result<Subscription, TransportError>;

    /// Whether the bus currently accepts operations.
    fn is_reachable(&self) -> bool;

    /// Close the bus, ending every subscription.
    async fn close(&self);
}

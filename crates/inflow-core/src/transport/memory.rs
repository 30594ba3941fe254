// Copyright (C) 2025 Inflow Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! In-process transport backends.
//!
//! [`MemoryLog`] and [`MemoryBus`] implement the transport traits without
//! any external broker. They back embedded deployments and tests; the
//! semantics mirror a partitioned log and a subject bus closely enough
//! that code written against them behaves the same on a real cluster.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use tokio::sync::mpsc;

use super::{
    AppendTransport, BusMessage, DeliveryCallback, DeliveryReceipt, EventBus, FetchedEntry,
    Subscription,
};
use crate::error::TransportError;

#[derive(Debug, Clone)]
struct LogEntry {
    payload: Vec<u8>,
    appended_at: DateTime<Utc>,
}

/// Partitioned append log held entirely in memory.
///
/// Appends rotate across partitions round-robin. Offsets are dense per
/// partition, starting at zero, so every append has a stable
/// `category:partition:offset` address.
#[derive(Debug)]
pub struct MemoryLog {
    partitions: u32,
    next_partition: AtomicU32,
    open: AtomicBool,
    topics: RwLock<HashMap<String, Vec<Vec<LogEntry>>>>,
}

impl MemoryLog {
    /// Create a log with the given partition count (minimum one).
    pub fn new(partitions: u32) -> Self {
        Self {
            partitions: partitions.max(1),
            next_partition: AtomicU32::new(0),
            open: AtomicBool::new(true),
            topics: RwLock::new(HashMap::new()),
        }
    }

    /// Total number of entries appended under `category`.
    pub fn entry_count(&self, category: &str) -> usize {
        let topics = self.topics.read().unwrap_or_else(PoisonError::into_inner);
        topics
            .get(category)
            .map(|partitions| partitions.iter().map(Vec::len).sum())
            .unwrap_or(0)
    }
}

#[async_trait]
impl AppendTransport for MemoryLog {
    async fn produce(
        &self,
        category: &str,
        payload: Vec<u8>,
        on_delivery: DeliveryCallback,
    ) -> Result<(), TransportError> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        let partition = self.next_partition.fetch_add(1, Ordering::SeqCst) % self.partitions;
        let receipt = {
            let mut topics = self.topics.write().unwrap_or_else(PoisonError::into_inner);
            let slots = topics
                .entry(category.to_string())
                .or_insert_with(|| vec![Vec::new(); self.partitions as usize]);
            let slot = &mut slots[partition as usize];
            slot.push(LogEntry {
                payload,
                // Whole seconds, matching the record timestamp convention.
                appended_at: Utc::now().trunc_subsecs(0),
            });
            DeliveryReceipt {
                category: category.to_string(),
                partition,
                offset: (slot.len() - 1) as u64,
            }
        };
        // Confirm outside the lock so the callback may touch the log again.
        on_delivery(Ok(receipt));
        Ok(())
    }

    async fn fetch(
        &self,
        category: &str,
        partition: u32,
        offset: u64,
    ) -> Result<Option<FetchedEntry>, TransportError> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        let topics = self.topics.read().unwrap_or_else(PoisonError::into_inner);
        let entry = topics
            .get(category)
            .and_then(|slots| slots.get(partition as usize))
            .and_then(|slot| slot.get(offset as usize))
            .map(|entry| FetchedEntry {
                payload: entry.payload.clone(),
                appended_at: entry.appended_at,
            });
        Ok(entry)
    }

    fn is_reachable(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }
}

/// Subject bus backed by in-process channels.
///
/// Every subscriber of a subject receives every message published to it.
/// Dropped subscriptions are pruned on the next publish.
#[derive(Debug, Default)]
pub struct MemoryBus {
    closed: AtomicBool,
    subscribers: RwLock<HashMap<String, Vec<mpsc::UnboundedSender<BusMessage>>>>,
}

impl MemoryBus {
    /// Create an open bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventBus for MemoryBus {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        let message = BusMessage {
            subject: subject.to_string(),
            payload,
        };
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(senders) = subscribers.get_mut(subject) {
            senders.retain(|tx| tx.send(message.clone()).is_ok());
        }
        Ok(())
    }

    async fn subscribe(&self, subject: &str) -> Result<Subscription, TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.entry(subject.to_string()).or_default().push(tx);
        Ok(Subscription { rx })
    }

    fn is_reachable(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        // Dropping the senders ends every open subscription.
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

// Copyright (C) 2025 Inflow Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use inflow_core::delivery::DeliveryBridge;
use inflow_core::error::TransportError;
use inflow_core::transport::{AppendTransport, DeliveryCallback, FetchedEntry, MemoryLog};
use serde_json::{Value, json};

/// A payload shaped like a typical inbound record body.
pub fn sample_payload() -> Value {
    json!({"patient": "123", "status": "active"})
}

/// An in-memory log wired to a bridge with the given confirmation timeout.
pub fn memory_bridge(partitions: u32, timeout: Duration) -> (Arc<MemoryLog>, Arc<DeliveryBridge>) {
    let log = Arc::new(MemoryLog::new(partitions));
    let bridge = Arc::new(DeliveryBridge::new(log.clone(), timeout));
    (log, bridge)
}

/// Poll `condition` for up to two seconds, panicking if it never holds.
pub async fn wait_until<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met within two seconds");
}

/// Transport that reports a delivery failure for every produce.
pub struct FailingLog {
    pub reason: String,
}

#[async_trait]
impl AppendTransport for FailingLog {
    async fn produce(
        &self,
        _category: &str,
        _payload: Vec<u8>,
        on_delivery: DeliveryCallback,
    ) -> Result<(), TransportError> {
        on_delivery(Err(TransportError::Unavailable {
            reason: self.reason.clone(),
        }));
        Ok(())
    }

    async fn fetch(
        &self,
        _category: &str,
        _partition: u32,
        _offset: u64,
    ) -> Result<Option<FetchedEntry>, TransportError> {
        Ok(None)
    }

    fn is_reachable(&self) -> bool {
        false
    }

    async fn close(&self) {}
}

/// Transport that accepts produces but never confirms them.
#[derive(Default)]
pub struct BlackholeLog {
    held: Mutex<Vec<DeliveryCallback>>,
}

#[async_trait]
impl AppendTransport for BlackholeLog {
    async fn produce(
        &self,
        _category: &str,
        _payload: Vec<u8>,
        on_delivery: DeliveryCallback,
    ) -> Result<(), TransportError> {
        self.held.lock().unwrap().push(on_delivery);
        Ok(())
    }

    async fn fetch(
        &self,
        _category: &str,
        _partition: u32,
        _offset: u64,
    ) -> Result<Option<FetchedEntry>, TransportError> {
        Ok(None)
    }

    fn is_reachable(&self) -> bool {
        true
    }

    async fn close(&self) {}
}

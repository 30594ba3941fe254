// Copyright (C) 2025 Inflow Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Cross-instance broadcast and replay through a shared bus.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::{SubsecRound, Utc};
use inflow_core::config::SYNC_SUBJECT;
use inflow_core::delivery::DeliveryBridge;
use inflow_core::events::SyncEvent;
use inflow_core::record::{DataRecord, InboundRecord, StoredRecord};
use inflow_core::sync::{BroadcastPipeline, SyncListener};
use inflow_core::transport::{AppendTransport, EventBus, MemoryBus, MemoryLog};
use inflow_core::workflow::run_workflow;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use common::{memory_bridge, sample_payload, wait_until};

fn peer_event_payload(instance_id: &str) -> Vec<u8> {
    let stored = StoredRecord {
        id: Uuid::new_v4(),
        created_at: Utc::now().trunc_subsecs(0),
        origin_url: "http://peer/data".to_string(),
        data_format: "orders".to_string(),
        payload: json!({"value": 7}).to_string(),
    };
    let record = DataRecord::confirmed(stored, "orders:0:3".to_string(), 0.01, 0.02);
    serde_json::to_vec(&SyncEvent::new(instance_id, record)).unwrap()
}

#[tokio::test]
async fn test_record_stored_on_one_instance_replays_on_the_other() {
    let bus: Arc<MemoryBus> = Arc::new(MemoryBus::new());
    let (local_log, local_bridge) = memory_bridge(1, Duration::from_secs(5));
    let (peer_log, peer_bridge) = memory_bridge(1, Duration::from_secs(5));
    let shutdown = CancellationToken::new();

    // Both instances listen before anything is stored.
    let local_listener = SyncListener::new("abc", local_bridge.clone())
        .start(bus.clone(), shutdown.clone())
        .await
        .unwrap();
    let peer_listener = SyncListener::new("xyz", peer_bridge)
        .start(bus.clone(), shutdown.clone())
        .await
        .unwrap();

    let inbound =
        InboundRecord::new(sample_payload(), "http://localhost/data").with_data_format("orders");
    let pipeline = Arc::new(BroadcastPipeline::new("abc", bus.clone()));
    let record = run_workflow(inbound, local_bridge, pipeline).await.unwrap();

    wait_until(|| peer_log.entry_count("replay") == 1).await;

    // The peer holds the announcement verbatim; the originator dropped it.
    let entry = peer_log.fetch("replay", 0, 0).await.unwrap().unwrap();
    let event: SyncEvent = serde_json::from_slice(&entry.payload).unwrap();
    assert_eq!(event.instance_id, "abc");
    assert_eq!(event.record.record.id, record.record.id);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(local_log.entry_count("replay"), 0);

    shutdown.cancel();
    local_listener.await.unwrap();
    peer_listener.await.unwrap();
}

#[tokio::test]
async fn test_duplicate_announcements_are_each_replayed() {
    let bus: Arc<MemoryBus> = Arc::new(MemoryBus::new());
    let (log, bridge) = memory_bridge(1, Duration::from_secs(5));
    let shutdown = CancellationToken::new();
    let listener = SyncListener::new("abc", bridge)
        .start(bus.clone(), shutdown.clone())
        .await
        .unwrap();

    let payload = peer_event_payload("xyz");
    bus.publish(SYNC_SUBJECT, payload.clone()).await.unwrap();
    bus.publish(SYNC_SUBJECT, payload).await.unwrap();

    wait_until(|| log.entry_count("replay") == 2).await;

    shutdown.cancel();
    listener.await.unwrap();
}

#[tokio::test]
async fn test_listener_survives_malformed_events() {
    let bus: Arc<MemoryBus> = Arc::new(MemoryBus::new());
    let (log, bridge) = memory_bridge(1, Duration::from_secs(5));
    let shutdown = CancellationToken::new();
    let listener = SyncListener::new("abc", bridge)
        .start(bus.clone(), shutdown.clone())
        .await
        .unwrap();

    bus.publish(SYNC_SUBJECT, b"not json".to_vec())
        .await
        .unwrap();
    bus.publish(SYNC_SUBJECT, peer_event_payload("xyz"))
        .await
        .unwrap();

    wait_until(|| log.entry_count("replay") == 1).await;

    shutdown.cancel();
    listener.await.unwrap();
}

#[tokio::test]
async fn test_listener_survives_forward_failures() {
    let bus: Arc<MemoryBus> = Arc::new(MemoryBus::new());
    let log = Arc::new(MemoryLog::new(1));
    log.close().await;
    let bridge = Arc::new(DeliveryBridge::new(log, Duration::from_secs(5)));
    let shutdown = CancellationToken::new();
    let listener = SyncListener::new("abc", bridge)
        .start(bus.clone(), shutdown.clone())
        .await
        .unwrap();

    bus.publish(SYNC_SUBJECT, peer_event_payload("xyz"))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!listener.is_finished());

    shutdown.cancel();
    listener.await.unwrap();
}

#[tokio::test]
async fn test_listener_stops_when_the_bus_closes() {
    let bus: Arc<MemoryBus> = Arc::new(MemoryBus::new());
    let (_log, bridge) = memory_bridge(1, Duration::from_secs(5));
    let listener = SyncListener::new("abc", bridge)
        .start(bus.clone(), CancellationToken::new())
        .await
        .unwrap();

    bus.close().await;

    tokio::time::timeout(Duration::from_secs(2), listener)
        .await
        .expect("listener should stop once the bus closes")
        .unwrap();
}

#[tokio::test]
async fn test_listener_stops_on_cancellation() {
    let bus: Arc<MemoryBus> = Arc::new(MemoryBus::new());
    let (_log, bridge) = memory_bridge(1, Duration::from_secs(5));
    let shutdown = CancellationToken::new();
    let listener = SyncListener::new("abc", bridge)
        .start(bus.clone(), shutdown.clone())
        .await
        .unwrap();

    shutdown.cancel();

    tokio::time::timeout(Duration::from_secs(2), listener)
        .await
        .expect("listener should stop once cancelled")
        .unwrap();
}

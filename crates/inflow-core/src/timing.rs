// Copyright (C) 2025 Inflow Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Call timing instrumentation.
//!
//! [`timed`] wraps an async call, measures it, and announces the
//! measurement on the timing subject. Instrumentation never changes the
//! outcome of the wrapped call: a bus that rejects the event costs a
//! warning, nothing more.

use std::future::Future;
use std::time::Instant;

use tracing::warn;

use crate::config::TIMING_SUBJECT;
use crate::events::TimingEvent;
use crate::transport::EventBus;

/// Run `call`, publish how long it took, and return its output.
pub async fn timed<T, F, Fut>(bus: &dyn EventBus, function: &str, call: F) -> T
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    let started = Instant::now();
    let output = call().await;
    let event = TimingEvent::new(function, started.elapsed().as_secs_f64());
    match serde_json::to_vec(&event) {
        Ok(payload) => {
            if let Err(error) = bus.publish(TIMING_SUBJECT, payload).await {
                warn!(function, error = %error, "timing event not published");
            }
        }
        Err(error) => {
            warn!(function, error = %error, "timing event not encoded");
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryBus;

    #[tokio::test]
    async fn test_timed_returns_call_output() {
        let bus = MemoryBus::new();
        let value = timed(&bus, "addition", || async { 41 + 1 }).await;
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_timed_publishes_measurement() {
        let bus = MemoryBus::new();
        let mut subscription = bus.subscribe(TIMING_SUBJECT).await.unwrap();
        timed(&bus, "ingest_data", || async {}).await;
        let message = subscription.recv().await.unwrap();
        let event: TimingEvent = serde_json::from_slice(&message.payload).unwrap();
        assert_eq!(event.function, "ingest_data");
        assert!(event.elapsed_seconds >= 0.0);
    }

    #[tokio::test]
    async fn test_timed_survives_closed_bus() {
        let bus = MemoryBus::new();
        bus.close().await;
        let value = timed(&bus, "addition", || async { 7 }).await;
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_timed_passes_errors_through() {
        let bus = MemoryBus::new();
        let result: Result<(), String> =
            timed(&bus, "failing", || async { Err("boom".to_string()) }).await;
        assert_eq!(result.unwrap_err(), "boom");
    }
}

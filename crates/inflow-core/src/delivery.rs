// Copyright (C) 2025 Inflow Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Delivery confirmation bridge.
//!
//! Append transports confirm produces through a one-shot callback. The
//! [`DeliveryBridge`] turns that callback style into an awaitable call by
//! wiring each produce to its own oneshot channel, so concurrent appends
//! never observe each other's confirmations and a confirmation that never
//! arrives surfaces as an error instead of a hang.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, instrument};

use crate::error::StorageError;
use crate::transport::{AppendTransport, DeliveryCallback};

/// Outcome of a confirmed append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// `category:partition:offset` address of the appended record.
    pub location: String,
    /// Time from produce to confirmation.
    pub elapsed: Duration,
}

/// Awaitable front end over a callback-confirmed append transport.
#[derive(Clone)]
pub struct DeliveryBridge {
    transport: Arc<dyn AppendTransport>,
    timeout: Duration,
}

impl DeliveryBridge {
    /// Create a bridge that waits at most `timeout` for each confirmation.
    pub fn new(transport: Arc<dyn AppendTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Append `payload` under `category` and wait for the confirmation.
    ///
    /// Returns the record's location once the transport confirms. Fails
    /// if the produce is rejected, the transport reports a delivery
    /// error, the confirmation is dropped, or the timeout elapses.
    #[instrument(skip(self, payload), fields(category = %category))]
    pub async fn append(&self, category: &str, payload: Vec<u8>) -> Result<Delivery, StorageError> {
        let started = Instant::now();
        let (tx, rx) = oneshot::channel();
        let on_delivery: DeliveryCallback = Box::new(move |result| {
            // The receiver may have timed out already; nothing to do then.
            let _ = tx.send(result);
        });

        self.transport
            .produce(category, payload, on_delivery)
            .await
            .map_err(|source| StorageError::Delivery {
                category: category.to_string(),
                source,
            })?;

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(Ok(receipt))) => {
                let delivery = Delivery {
                    location: receipt.location(),
                    elapsed: started.elapsed(),
                };
                debug!(location = %delivery.location, "append confirmed");
                Ok(delivery)
            }
            Ok(Ok(Err(source))) => Err(StorageError::Delivery {
                category: category.to_string(),
                source,
            }),
            Ok(Err(_)) => Err(StorageError::ConfirmationDropped {
                category: category.to_string(),
            }),
            Err(_) => Err(StorageError::ConfirmationTimeout {
                category: category.to_string(),
                waited: self.timeout,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::TransportError;
    use crate::transport::{FetchedEntry, MemoryLog};

    /// Reports a delivery failure through the callback.
    struct FailingLog {
        reason: String,
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

    /// Accepts produces but never confirms them.
    #[derive(Default)]
    struct BlackholeLog {
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

    /// Drops the callback without ever invoking it.
    struct DroppingLog;

    #[async_trait]
    impl AppendTransport for DroppingLog {
        async fn produce(
            &self,
            _category: &str,
            _payload: Vec<u8>,
            on_delivery: DeliveryCallback,
        ) -> Result<(), TransportError> {
            drop(on_delivery);
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

    #[tokio::test]
    async fn test_append_returns_location() {
        let bridge = DeliveryBridge::new(Arc::new(MemoryLog::new(1)), Duration::from_secs(5));
        let delivery = bridge.append("records", b"payload".to_vec()).await.unwrap();
        assert_eq!(delivery.location, "records:0:0");
    }

    #[tokio::test]
    async fn test_append_rejected_produce() {
        let log = Arc::new(MemoryLog::new(1));
        log.close().await;
        let bridge = DeliveryBridge::new(log, Duration::from_secs(5));
        let err = bridge.append("records", b"x".to_vec()).await.unwrap_err();
        assert_eq!(
            err,
            StorageError::Delivery {
                category: "records".to_string(),
                source: TransportError::Closed,
            }
        );
    }

    #[tokio::test]
    async fn test_append_delivery_failure() {
        let bridge = DeliveryBridge::new(
            Arc::new(FailingLog {
                reason: "broker unavailable".to_string(),
            }),
            Duration::from_secs(5),
        );
        let err = bridge.append("records", b"x".to_vec()).await.unwrap_err();
        assert!(err.to_string().contains("broker unavailable"));
    }

    #[tokio::test]
    async fn test_append_dropped_confirmation() {
        let bridge = DeliveryBridge::new(Arc::new(DroppingLog), Duration::from_secs(5));
        let err = bridge.append("records", b"x".to_vec()).await.unwrap_err();
        assert_eq!(
            err,
            StorageError::ConfirmationDropped {
                category: "records".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_append_confirmation_timeout() {
        let bridge = DeliveryBridge::new(
            Arc::new(BlackholeLog::default()),
            Duration::from_millis(50),
        );
        let err = bridge.append("records", b"x".to_vec()).await.unwrap_err();
        assert_eq!(
            err,
            StorageError::ConfirmationTimeout {
                category: "records".to_string(),
                waited: Duration::from_millis(50),
            }
        );
    }

    #[tokio::test]
    async fn test_concurrent_appends_get_distinct_locations() {
        let bridge = DeliveryBridge::new(Arc::new(MemoryLog::new(1)), Duration::from_secs(5));
        let (first, second) = tokio::join!(
            bridge.append("records", b"a".to_vec()),
            bridge.append("records", b"b".to_vec()),
        );
        let mut locations = vec![first.unwrap().location, second.unwrap().location];
        locations.sort();
        assert_eq!(locations, vec!["records:0:0", "records:0:1"]);
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 resocks5 Contributors

//! Push-event subscription lifecycle

use async_trait::async_trait;
use resocks5_common::{Error, EventListener, ProxyEvent, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Source of pushed proxy lifecycle events
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Start a subscription. Events must be buffered in the returned
    /// receiver from the moment this returns.
    async fn subscribe(&self) -> Result<mpsc::Receiver<ProxyEvent>>;
}

/// The listener only returns once the backend accepted the stream, and a
/// failed first connection becomes an error here.
#[async_trait]
impl EventSource for EventListener {
    async fn subscribe(&self) -> Result<mpsc::Receiver<ProxyEvent>> {
        self.listen()
            .await
            .map_err(|e| Error::Backend(format!("{:#}", e)))
    }
}

/// Active subscription for one main-screen mount
///
/// Forwards every received event to the handler until cancelled or dropped,
/// so handlers never outlive the mount that created them.
#[derive(Debug)]
pub struct EventSubscription {
    task: JoinHandle<()>,
}

impl EventSubscription {
    /// Forward events from `rx` to `handler`. Forwarding stops when the
    /// handler returns false or the source closes.
    pub fn forward<F>(mut rx: mpsc::Receiver<ProxyEvent>, mut handler: F) -> Self
    where
        F: FnMut(ProxyEvent) -> bool + Send + 'static,
    {
        let task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if !handler(event) {
                    break;
                }
            }
            tracing::debug!("Event subscription ended");
        });

        Self { task }
    }

    pub fn cancel(self) {
        // Drop aborts the task
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[tokio::test]
    async fn test_forwards_events_in_order() {
        let (tx, rx) = mpsc::channel(8);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _subscription = EventSubscription::forward(rx, move |event| {
            sink.lock().unwrap().push(event);
            true
        });

        tx.send(ProxyEvent::Started).await.unwrap();
        tx.send(ProxyEvent::Stopped).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec![ProxyEvent::Started, ProxyEvent::Stopped]
        );
    }

    #[tokio::test]
    async fn test_cancel_releases_source() {
        let (tx, rx) = mpsc::channel(8);
        let subscription = EventSubscription::forward(rx, |_| true);
        assert!(subscription.is_active());

        subscription.cancel();
        tokio::time::sleep(Duration::from_millis(20)).await;

        // The aborted task dropped the receiver
        assert!(tx.is_closed());
    }

    #[tokio::test]
    async fn test_handler_can_end_subscription() {
        let (tx, rx) = mpsc::channel(8);
        let subscription = EventSubscription::forward(rx, |_| false);

        tx.send(ProxyEvent::Started).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!subscription.is_active());
    }

    #[tokio::test]
    async fn test_listener_subscribe_fails_without_backend() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = resocks5_common::BackendClientConfig {
            backend_port: listener.local_addr().unwrap().port(),
            ..Default::default()
        };
        drop(listener);

        let result = EventListener::new(config).subscribe().await;
        assert!(matches!(result, Err(Error::Backend(_))));
    }
}

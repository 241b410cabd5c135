// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 resocks5 Contributors

//! Server-Sent Events listener for proxy lifecycle notifications
//!
//! The backend publishes `proxy-started` and `proxy-stopped` on
//! `GET /api/events`. Anything else on the stream (heartbeats, future event
//! kinds) is ignored.

use anyhow::{Context, Result};
use futures_util::StreamExt;
use reqwest::Response;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

use crate::{add_auth_header, BackendClientConfig, ProxyEvent};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// JSON form some backends put on the `data:` line instead of `event:`
#[derive(Debug, Deserialize)]
struct EventEnvelope {
    #[serde(rename = "type")]
    kind: String,
}

/// Event listener for the backend SSE stream
pub struct EventListener {
    config: BackendClientConfig,
}

impl EventListener {
    /// Create a new event listener
    pub fn new(config: BackendClientConfig) -> Self {
        Self { config }
    }

    /// Start listening to backend events
    /// Returns once the backend has accepted the stream, so every event it
    /// publishes from then on reaches the returned receiver. Fails if that
    /// first connection fails. Later drops reconnect with exponential
    /// backoff, and the listener stops once the receiver is dropped.
    pub async fn listen(&self) -> Result<mpsc::Receiver<ProxyEvent>> {
        let (tx, rx) = mpsc::channel(100);
        let response = Self::connect(&self.config).await?;

        let config = self.config.clone();
        tokio::spawn(async move {
            let mut backoff = INITIAL_BACKOFF;
            let mut response = Some(response);

            loop {
                let result = match response.take() {
                    Some(response) => Self::stream_events(response, &tx).await,
                    None => match Self::connect(&config).await {
                        Ok(response) => Self::stream_events(response, &tx).await,
                        Err(e) => Err(e),
                    },
                };

                match result {
                    Ok(true) => backoff = INITIAL_BACKOFF,
                    Ok(false) => {}
                    Err(e) => tracing::warn!("Event stream error: {:#}", e),
                }

                if tx.is_closed() {
                    tracing::debug!("Event receiver dropped, stopping event listener");
                    break;
                }

                tokio::select! {
                    _ = sleep(backoff) => {}
                    _ = tx.closed() => break,
                }
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        });

        Ok(rx)
    }

    async fn connect(config: &BackendClientConfig) -> Result<Response> {
        let url = format!("{}/api/events", config.backend_base_url());

        let client = crate::create_backend_client(config, true)?;
        let request = add_auth_header(client.get(&url), config);

        let response = request
            .send()
            .await
            .context("Failed to connect to event stream")?;

        if !response.status().is_success() {
            anyhow::bail!("Event stream request failed: {}", response.status());
        }

        tracing::info!("Connected to backend event stream");
        Ok(response)
    }

    /// Stream events until the connection ends or the receiver is dropped.
    /// Returns whether any event was delivered, which resets the reconnect
    /// backoff.
    async fn stream_events(response: Response, tx: &mpsc::Sender<ProxyEvent>) -> Result<bool> {
        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();
        let mut delivered = false;

        loop {
            let chunk = tokio::select! {
                chunk = stream.next() => chunk,
                _ = tx.closed() => return Ok(delivered),
            };

            let bytes = match chunk {
                Some(Ok(bytes)) => bytes,
                Some(Err(e)) => {
                    tracing::error!("Error reading event stream: {}", e);
                    break;
                }
                None => break,
            };
            buffer.extend_from_slice(&bytes);

            while let Some(message) = take_message(&mut buffer) {
                tracing::trace!("Raw SSE message: {:?}", message);

                if let Some(event) = parse_sse_message(&message) {
                    tracing::debug!("Received {}", event.event_name());
                    if tx.send(event).await.is_err() {
                        return Ok(delivered);
                    }
                    delivered = true;
                }
            }
        }

        tracing::debug!("Event stream closed by backend");
        Ok(delivered)
    }
}

/// Remove the first complete message from `buffer`
///
/// A message ends at an empty line. Lines may end in CRLF, LF or CR; a CR at
/// the very end of the buffer waits for the next chunk since it may be the
/// first half of a CRLF. The message is decoded only once complete, so
/// multi-byte characters split across chunks survive.
fn take_message(buffer: &mut Vec<u8>) -> Option<String> {
    let mut line_start = 0;
    let mut i = 0;

    while i < buffer.len() {
        let terminator = match buffer[i] {
            b'\n' => 1,
            b'\r' => match buffer.get(i + 1) {
                Some(b'\n') => 2,
                Some(_) => 1,
                None => return None,
            },
            _ => {
                i += 1;
                continue;
            }
        };

        if i == line_start {
            let raw: Vec<u8> = buffer.drain(..i + terminator).collect();
            let text = String::from_utf8_lossy(&raw);
            return Some(text.replace("\r\n", "\n").replace('\r', "\n"));
        }

        i += terminator;
        line_start = i;
    }

    None
}

/// Parse an SSE message into a ProxyEvent
///
/// The `event:` field wins; a `data:` line carrying `{"type": "..."}` is used
/// when the message has no event name.
pub fn parse_sse_message(message: &str) -> Option<ProxyEvent> {
    let mut event_name = None;
    let mut data = String::new();

    for line in message.lines() {
        if let Some(value) = line.strip_prefix("event:") {
            event_name = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("data:") {
            data.push_str(value.trim());
        }
    }

    if let Some(name) = event_name {
        return ProxyEvent::from_event_name(&name);
    }

    if data.is_empty() {
        return None;
    }

    match serde_json::from_str::<EventEnvelope>(&data) {
        Ok(envelope) => ProxyEvent::from_event_name(&envelope.kind),
        Err(e) => {
            tracing::warn!("Failed to parse SSE event: {} (error: {})", data, e);
            None
        }
    }
}

impl Default for EventListener {
    fn default() -> Self {
        Self::new(BackendClientConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::oneshot;
    use tokio::time::timeout;

    const STREAM_HEADERS: &[u8] = b"HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ncache-control: no-cache\r\nconnection: close\r\n\r\n";

    async fn read_request(socket: &mut TcpStream) {
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..n]);
        }
    }

    /// Wait until the client closes the connection
    async fn hold_open(socket: &mut TcpStream) {
        let mut chunk = [0u8; 64];
        while socket.read(&mut chunk).await.map(|n| n > 0).unwrap_or(false) {}
    }

    /// Write `parts` as separate TCP writes
    async fn write_parts(socket: &mut TcpStream, parts: &[&[u8]]) {
        socket.write_all(STREAM_HEADERS).await.unwrap();
        socket.flush().await.unwrap();
        for part in parts {
            socket.write_all(part).await.unwrap();
            socket.flush().await.unwrap();
            sleep(Duration::from_millis(20)).await;
        }
    }

    async fn bind() -> (TcpListener, BackendClientConfig) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = BackendClientConfig {
            backend_port: listener.local_addr().unwrap().port(),
            ..BackendClientConfig::default()
        };
        (listener, config)
    }

    /// Serve one stream that sends `parts` and then stays open
    async fn serve_once(parts: Vec<&'static [u8]>) -> BackendClientConfig {
        let (listener, config) = bind().await;
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            write_parts(&mut socket, &parts).await;
            hold_open(&mut socket).await;
        });
        config
    }

    async fn collect(rx: &mut mpsc::Receiver<ProxyEvent>, count: usize) -> Vec<ProxyEvent> {
        let mut events = Vec::new();
        while events.len() < count {
            match timeout(Duration::from_secs(2), rx.recv()).await {
                Ok(Some(event)) => events.push(event),
                _ => break,
            }
        }
        events
    }

    #[test]
    fn test_parse_named_events() {
        assert_eq!(
            parse_sse_message("event: proxy-started\ndata:\n"),
            Some(ProxyEvent::Started)
        );
        assert_eq!(
            parse_sse_message("event:proxy-stopped"),
            Some(ProxyEvent::Stopped)
        );
    }

    #[test]
    fn test_parse_json_data_fallback() {
        assert_eq!(
            parse_sse_message("data: {\"type\":\"proxy-stopped\"}"),
            Some(ProxyEvent::Stopped)
        );
    }

    #[test]
    fn test_ignores_unknown_and_comments() {
        assert_eq!(parse_sse_message("event: heartbeat\ndata: {}"), None);
        assert_eq!(parse_sse_message(": keep-alive"), None);
        assert_eq!(parse_sse_message("data: not json"), None);
    }

    #[test]
    fn test_take_message_waits_for_blank_line() {
        let mut buffer = b"event: proxy-started\n".to_vec();
        assert_eq!(take_message(&mut buffer), None);

        buffer.extend_from_slice(b"\nevent: proxy-stopped");
        assert_eq!(
            take_message(&mut buffer).as_deref(),
            Some("event: proxy-started\n\n")
        );
        assert_eq!(buffer, b"event: proxy-stopped");
    }

    #[test]
    fn test_take_message_line_endings() {
        let mut buffer = b"event: proxy-started\r\n\r\nevent: proxy-stopped\r\revent: x\r".to_vec();
        let first = take_message(&mut buffer).unwrap();
        assert_eq!(parse_sse_message(&first), Some(ProxyEvent::Started));
        let second = take_message(&mut buffer).unwrap();
        assert_eq!(parse_sse_message(&second), Some(ProxyEvent::Stopped));
        // A trailing CR may still become a CRLF
        assert_eq!(take_message(&mut buffer), None);
    }

    #[tokio::test]
    async fn test_listen_returns_after_backend_accepted_stream() {
        let (listener, config) = bind().await;
        let request_seen = Arc::new(AtomicBool::new(false));
        let seen = request_seen.clone();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            seen.store(true, Ordering::SeqCst);
            write_parts(&mut socket, &[]).await;
            hold_open(&mut socket).await;
        });

        let _rx = EventListener::new(config).listen().await.unwrap();
        assert!(request_seen.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_listen_fails_when_backend_unreachable() {
        let (listener, config) = bind().await;
        drop(listener);
        assert!(EventListener::new(config).listen().await.is_err());
    }

    #[tokio::test]
    async fn test_events_forwarded_and_heartbeat_ignored() {
        let config = serve_once(vec![
            &b"event: heartbeat\ndata: {}\n\n"[..],
            &b"event: proxy-started\ndata:\n\n"[..],
            &b": keep-alive\n\nevent: proxy-stopped\n\n"[..],
        ])
        .await;

        let mut rx = EventListener::new(config).listen().await.unwrap();
        assert_eq!(
            collect(&mut rx, 2).await,
            vec![ProxyEvent::Started, ProxyEvent::Stopped]
        );
    }

    #[tokio::test]
    async fn test_multibyte_text_split_across_chunks() {
        let config = serve_once(vec![
            &b"event: proxy-started\n\n: caf\xC3"[..],
            &b"\xA9\n\nevent: proxy-stopped\n\n"[..],
        ])
        .await;

        let mut rx = EventListener::new(config).listen().await.unwrap();
        assert_eq!(
            collect(&mut rx, 2).await,
            vec![ProxyEvent::Started, ProxyEvent::Stopped]
        );
    }

    #[tokio::test]
    async fn test_crlf_split_across_chunks() {
        let config = serve_once(vec![
            &b"event: proxy-started\r\n\r"[..],
            &b"\nevent: proxy-stopped\r\n\r\n"[..],
        ])
        .await;

        let mut rx = EventListener::new(config).listen().await.unwrap();
        assert_eq!(
            collect(&mut rx, 2).await,
            vec![ProxyEvent::Started, ProxyEvent::Stopped]
        );
    }

    #[tokio::test]
    async fn test_reconnects_after_stream_closes() {
        let (listener, config) = bind().await;
        let connections = Arc::new(AtomicUsize::new(0));
        let count = connections.clone();
        tokio::spawn(async move {
            // First stream closes right after one event
            let (mut socket, _) = listener.accept().await.unwrap();
            count.fetch_add(1, Ordering::SeqCst);
            read_request(&mut socket).await;
            write_parts(&mut socket, &[&b"event: proxy-started\n\n"[..]]).await;
            drop(socket);

            let (mut socket, _) = listener.accept().await.unwrap();
            count.fetch_add(1, Ordering::SeqCst);
            read_request(&mut socket).await;
            write_parts(&mut socket, &[&b"event: proxy-stopped\n\n"[..]]).await;
            hold_open(&mut socket).await;
        });

        let mut rx = EventListener::new(config).listen().await.unwrap();
        assert_eq!(collect(&mut rx, 1).await, vec![ProxyEvent::Started]);

        // Reconnect happens after the initial one second backoff
        let next = timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
        assert_eq!(next, Some(ProxyEvent::Stopped));
        assert_eq!(connections.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_dropping_receiver_closes_stream() {
        let (listener, config) = bind().await;
        let (closed_tx, closed_rx) = oneshot::channel();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            write_parts(&mut socket, &[]).await;
            hold_open(&mut socket).await;
            let _ = closed_tx.send(());
        });

        let rx = EventListener::new(config).listen().await.unwrap();
        drop(rx);

        assert!(timeout(Duration::from_secs(2), closed_rx).await.is_ok());
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 resocks5 Contributors

//! In-memory collaborators for engine tests

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use resocks5_common::{Error, ProxyEvent, Result, Settings, DEFAULT_LOCAL_ADDRESS};
use tokio::sync::{mpsc, oneshot};

use crate::backend::ProxyBackend;
use crate::clipboard::Clipboard;
use crate::events::EventSource;

pub fn sample_settings(enabled: bool) -> Settings {
    Settings {
        enabled,
        server_address: "141.141.141.141".to_string(),
        server_port: 1080,
        server_login: "admin".to_string(),
        server_password: "123456".to_string(),
    }
}

/// Holds a backend call open until released
pub struct Gate<T> {
    tx: oneshot::Sender<T>,
}

impl<T> Gate<T> {
    pub fn release(self, value: T) {
        let _ = self.tx.send(value);
    }
}

#[derive(Default)]
struct BackendState {
    running: bool,
    settings: Settings,
    saved: Vec<Settings>,
    start_calls: usize,
    stop_calls: usize,
    query_gate: Option<oneshot::Receiver<Result<bool>>>,
    start_gate: Option<oneshot::Receiver<Result<()>>>,
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<BackendState>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_running(&self, running: bool) {
        self.state.lock().unwrap().running = running;
    }

    pub fn set_settings(&self, settings: Settings) {
        self.state.lock().unwrap().settings = settings;
    }

    /// The next "is running" query resolves only when the gate is released
    pub fn hold_query(&self) -> Gate<Result<bool>> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().unwrap().query_gate = Some(rx);
        Gate { tx }
    }

    /// The next start command resolves only when the gate is released
    pub fn hold_start(&self) -> Gate<Result<()>> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().unwrap().start_gate = Some(rx);
        Gate { tx }
    }

    pub fn start_calls(&self) -> usize {
        self.state.lock().unwrap().start_calls
    }

    pub fn stop_calls(&self) -> usize {
        self.state.lock().unwrap().stop_calls
    }

    pub fn saved(&self) -> Vec<Settings> {
        self.state.lock().unwrap().saved.clone()
    }
}

#[async_trait]
impl ProxyBackend for FakeBackend {
    async fn get_settings(&self) -> Result<Settings> {
        Ok(self.state.lock().unwrap().settings.clone())
    }

    async fn save_settings(&self, settings: Settings) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.settings = settings.clone();
        state.saved.push(settings);
        Ok(())
    }

    async fn start_proxy(&self) -> Result<()> {
        let gate = {
            let mut state = self.state.lock().unwrap();
            state.start_calls += 1;
            state.start_gate.take()
        };

        if let Some(gate) = gate {
            return gate.await.unwrap_or(Err(Error::ChannelClosed));
        }

        self.state.lock().unwrap().running = true;
        Ok(())
    }

    async fn stop_proxy(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.stop_calls += 1;
        state.running = false;
        Ok(())
    }

    async fn is_proxy_running(&self) -> Result<bool> {
        let gate = self.state.lock().unwrap().query_gate.take();
        if let Some(gate) = gate {
            return gate.await.unwrap_or(Err(Error::ChannelClosed));
        }
        Ok(self.state.lock().unwrap().running)
    }

    async fn get_local_address(&self) -> Result<String> {
        Ok(DEFAULT_LOCAL_ADDRESS.to_string())
    }
}

#[derive(Clone, Default)]
pub struct FakeEvents {
    senders: Arc<Mutex<Vec<mpsc::Sender<ProxyEvent>>>>,
}

impl FakeEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total subscriptions ever opened
    pub fn subscriptions(&self) -> usize {
        self.senders.lock().unwrap().len()
    }

    /// Subscriptions whose receiver is still alive
    pub fn active(&self) -> usize {
        self.senders
            .lock()
            .unwrap()
            .iter()
            .filter(|tx| !tx.is_closed())
            .count()
    }

    pub async fn push(&self, event: ProxyEvent) {
        let senders: Vec<_> = self.senders.lock().unwrap().clone();
        for tx in senders {
            let _ = tx.send(event).await;
        }
    }

    pub async fn wait_subscribed(&self) {
        while self.active() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    pub async fn wait_released(&self) {
        while self.active() > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait]
impl EventSource for FakeEvents {
    async fn subscribe(&self) -> Result<mpsc::Receiver<ProxyEvent>> {
        let (tx, rx) = mpsc::channel(16);
        self.senders.lock().unwrap().push(tx);
        Ok(rx)
    }
}

#[derive(Clone, Default)]
pub struct FakeClipboard {
    contents: Arc<Mutex<Vec<String>>>,
}

impl FakeClipboard {
    pub fn contents(&self) -> Vec<String> {
        self.contents.lock().unwrap().clone()
    }
}

impl Clipboard for FakeClipboard {
    fn set_text(&self, text: &str) -> Result<()> {
        self.contents.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

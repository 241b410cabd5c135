// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 resocks5 Contributors

//! Event loop driving the view-state engine
//!
//! One task owns the [`ViewStateEngine`] and applies inputs strictly one at a
//! time. Backend calls and timers run as separate tasks that post their
//! outcome back into the same queue, so the UI keeps processing pushed events
//! while a command is pending and no state is ever shared behind a lock.

use std::future::Future;
use std::sync::Arc;

use resocks5_common::{Error, Result};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::backend::ProxyBackend;
use crate::clipboard::Clipboard;
use crate::engine::{Effect, EngineConfig, Msg, ViewSnapshot, ViewStateEngine};
use crate::events::{EventSource, EventSubscription};
use crate::router::Screen;
use crate::settings::{SettingsField, ValidatedDraft};

enum Input {
    Msg(Msg),
    Shutdown,
}

/// Runs the engine loop
pub struct EngineRuntime<B, E, C> {
    engine: ViewStateEngine,
    backend: Arc<B>,
    events: Arc<E>,
    clipboard: Arc<C>,
    tx: mpsc::UnboundedSender<Input>,
    rx: mpsc::UnboundedReceiver<Input>,
    snapshot_tx: watch::Sender<ViewSnapshot>,
    subscription: Option<EventSubscription>,
}

impl<B, E, C> EngineRuntime<B, E, C>
where
    B: ProxyBackend + 'static,
    E: EventSource + 'static,
    C: Clipboard + 'static,
{
    /// Spawn the engine loop on the current tokio runtime
    pub fn spawn(backend: B, events: E, clipboard: C, config: EngineConfig) -> EngineHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = ViewStateEngine::new(config);
        let (snapshot_tx, snapshot_rx) = watch::channel(engine.snapshot());

        let runtime = Self {
            engine,
            backend: Arc::new(backend),
            events: Arc::new(events),
            clipboard: Arc::new(clipboard),
            tx: tx.clone(),
            rx,
            snapshot_tx,
            subscription: None,
        };

        let task = tokio::spawn(runtime.run());

        EngineHandle {
            tx,
            snapshot: snapshot_rx,
            task: Arc::new(task),
        }
    }

    async fn run(mut self) {
        tracing::debug!("Engine loop started");

        while let Some(input) = self.rx.recv().await {
            let msg = match input {
                Input::Msg(msg) => msg,
                Input::Shutdown => break,
            };

            let effects = self.engine.handle(msg);
            // Publish before running effects so a render sees e.g. Starting
            // before the start command can possibly resolve.
            self.publish();

            for effect in effects {
                self.perform(effect).await;
            }
        }

        self.subscription = None;
        tracing::debug!("Engine loop stopped");
    }

    fn publish(&self) {
        let snapshot = self.engine.snapshot();
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }

    async fn perform(&mut self, effect: Effect) {
        tracing::trace!("Effect {:?}", effect);

        match effect {
            Effect::Subscribe => {
                // Awaited inline: the query issued next must not settle
                // before the handlers are in place.
                match self.events.subscribe().await {
                    Ok(rx) => {
                        let tx = self.tx.clone();
                        self.subscription = Some(EventSubscription::forward(rx, move |event| {
                            tx.send(Input::Msg(Msg::Event(event))).is_ok()
                        }));
                    }
                    Err(e) => tracing::warn!("Failed to subscribe to proxy events: {}", e),
                }
            }

            Effect::Unsubscribe => {
                if let Some(subscription) = self.subscription.take() {
                    subscription.cancel();
                }
            }

            Effect::QueryRunning => {
                let backend = self.backend.clone();
                self.run_task(async move { Msg::RunningQueried(backend.is_proxy_running().await) });
            }

            Effect::StartProxy => {
                let backend = self.backend.clone();
                self.run_task(async move { Msg::StartFinished(backend.start_proxy().await) });
            }

            Effect::StopProxy => {
                let backend = self.backend.clone();
                self.run_task(async move { Msg::StopFinished(backend.stop_proxy().await) });
            }

            Effect::FetchLocalAddress => {
                let backend = self.backend.clone();
                self.run_task(async move {
                    Msg::LocalAddressLoaded(backend.get_local_address().await)
                });
            }

            Effect::LoadSettings { visit } => {
                let backend = self.backend.clone();
                self.run_task(async move {
                    Msg::SettingsLoaded {
                        visit,
                        result: backend.get_settings().await,
                    }
                });
            }

            Effect::SaveSettings { visit, settings } => {
                let backend = self.backend.clone();
                self.run_task(async move {
                    Msg::SettingsSaved {
                        visit,
                        result: backend.save_settings(settings).await,
                    }
                });
            }

            Effect::SettleAfterSave { visit, delay } => {
                self.run_task(async move {
                    tokio::time::sleep(delay).await;
                    Msg::SaveSettled { visit }
                });
            }

            Effect::WriteClipboard(text) => {
                let result = self.clipboard.set_text(&text);
                self.post(Msg::ClipboardWritten(result));
            }

            Effect::ClearCopyFeedbackAfter(delay) => {
                self.run_task(async move {
                    tokio::time::sleep(delay).await;
                    Msg::CopyFeedbackElapsed
                });
            }
        }
    }

    fn post(&self, msg: Msg) {
        if self.tx.send(Input::Msg(msg)).is_err() {
            tracing::debug!("Engine stopped before a result could be queued");
        }
    }

    fn run_task<F>(&self, task: F)
    where
        F: Future<Output = Msg> + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let msg = task.await;
            if tx.send(Input::Msg(msg)).is_err() {
                tracing::debug!("Engine stopped before a command result arrived");
            }
        });
    }
}

/// Handle used by views to read state and forward intents
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<Input>,
    snapshot: watch::Receiver<ViewSnapshot>,
    task: Arc<JoinHandle<()>>,
}

impl EngineHandle {
    fn send(&self, msg: Msg) -> Result<()> {
        self.tx
            .send(Input::Msg(msg))
            .map_err(|_| Error::ChannelClosed)
    }

    pub fn open_main(&self) -> Result<()> {
        self.send(Msg::Navigate(Screen::Main))
    }

    pub fn open_settings(&self) -> Result<()> {
        self.send(Msg::Navigate(Screen::Settings))
    }

    /// Return to the main screen (refused while a save is in flight)
    pub fn close_settings(&self) -> Result<()> {
        self.send(Msg::Navigate(Screen::Main))
    }

    pub fn toggle(&self) -> Result<()> {
        self.send(Msg::Toggle)
    }

    pub fn edit(&self, field: SettingsField, value: impl Into<String>) -> Result<()> {
        self.send(Msg::EditSetting {
            field,
            value: value.into(),
        })
    }

    pub fn submit_settings(&self, draft: ValidatedDraft) -> Result<()> {
        self.send(Msg::SubmitSettings(draft))
    }

    pub fn copy_address(&self) -> Result<()> {
        self.send(Msg::CopyAddress)
    }

    /// Stop the engine loop; in-flight commands still complete on the backend
    pub fn shutdown(&self) {
        let _ = self.tx.send(Input::Shutdown);
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Latest published state
    pub fn snapshot(&self) -> ViewSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver for render triggers
    pub fn watch(&self) -> watch::Receiver<ViewSnapshot> {
        self.snapshot.clone()
    }

    /// Wait until the published state satisfies `predicate`
    pub async fn wait_for<F>(&self, predicate: F) -> Result<ViewSnapshot>
    where
        F: FnMut(&ViewSnapshot) -> bool,
    {
        let mut rx = self.snapshot.clone();
        let snapshot = rx
            .wait_for(predicate)
            .await
            .map_err(|_| Error::ChannelClosed)?;
        Ok(snapshot.clone())
    }
}

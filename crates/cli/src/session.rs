// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 resocks5 Contributors

//! Engine session for one CLI invocation

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tokio::time::timeout;

use resocks5_gui_core::{
    load_backend_config, BackendClient, ConnectionState, EngineConfig, EngineHandle,
    EngineRuntime, Error, EventListener, Screen, SettingsDraft, SettingsField, SystemClipboard,
    ValidatedDraft, ViewSnapshot,
};

/// How long to wait for the local address after the main screen mounts
const ADDRESS_WAIT: Duration = Duration::from_secs(2);

/// How long to wait for the clipboard write to be confirmed
const COPY_WAIT: Duration = Duration::from_secs(2);

/// How long a command waits for the engine to settle before giving up
const COMMAND_WAIT: Duration = Duration::from_secs(60);

pub struct Session {
    handle: EngineHandle,
    command_timeout: Duration,
}

impl Session {
    /// Load the backend configuration and spawn the engine
    pub fn connect(config_path: Option<&Path>) -> Result<Self> {
        let config = load_backend_config(config_path)?;
        // Leave room for a configured request timeout to fire first
        let command_timeout = match config.request_timeout_secs {
            Some(secs) => Duration::from_secs(secs + 5),
            None => COMMAND_WAIT,
        };

        let backend = BackendClient::with_config(config.clone())
            .context("Failed to create backend client")?;
        let events = EventListener::new(config);
        let handle = EngineRuntime::spawn(
            backend,
            events,
            SystemClipboard::new(),
            EngineConfig::default(),
        );

        Ok(Self::from_handle(handle, command_timeout))
    }

    fn from_handle(handle: EngineHandle, command_timeout: Duration) -> Self {
        Self {
            handle,
            command_timeout,
        }
    }

    pub fn watch(&self) -> watch::Receiver<ViewSnapshot> {
        self.handle.watch()
    }

    /// Mount the main screen and wait for the running-state query
    pub async fn open_main(&self) -> Result<ViewSnapshot> {
        self.handle.open_main()?;
        let snapshot = self
            .handle
            .wait_for(|s| s.screen == Some(Screen::Main) && s.running_known)
            .await?;
        Ok(snapshot)
    }

    /// Wait briefly for the local address; the main screen fetches it on mount
    pub async fn local_address(&self) -> Option<String> {
        match timeout(ADDRESS_WAIT, self.handle.wait_for(|s| s.local_address.is_some())).await {
            Ok(Ok(snapshot)) => snapshot.local_address,
            _ => self.handle.snapshot().local_address,
        }
    }

    /// Toggle from disconnected and wait for the start to settle
    ///
    /// Returns the connection state once the start resolved, or the current
    /// state if it did not resolve in time.
    pub async fn start(&self) -> Result<ConnectionState> {
        let mut rx = self.handle.watch();
        rx.borrow_and_update();
        self.handle.toggle()?;

        let settle = async {
            let mut progress = StartProgress::default();
            loop {
                if rx.changed().await.is_err() {
                    return ConnectionState::Disconnected;
                }
                let connection = rx.borrow_and_update().connection;
                if let Some(settled) = progress.observe(connection) {
                    return settled;
                }
            }
        };

        match timeout(self.command_timeout, settle).await {
            Ok(connection) => Ok(connection),
            Err(_) => Ok(self.handle.snapshot().connection),
        }
    }

    /// Toggle from connected and wait for the stop to resolve
    pub async fn stop(&self) -> Result<ConnectionState> {
        self.handle.toggle()?;
        let stopped = self
            .handle
            .wait_for(|s| s.connection == ConnectionState::Disconnected);

        match timeout(self.command_timeout, stopped).await {
            Ok(snapshot) => Ok(snapshot?.connection),
            Err(_) => Ok(self.handle.snapshot().connection),
        }
    }

    /// Copy the local address and wait for the confirmation
    ///
    /// Returns the published state while the confirmation shows, or None if
    /// the copy was not confirmed.
    pub async fn copy_address(&self) -> Result<Option<ViewSnapshot>> {
        self.handle.copy_address()?;
        match timeout(COPY_WAIT, self.handle.wait_for(|s| s.copied)).await {
            Ok(snapshot) => Ok(Some(snapshot?)),
            Err(_) => Ok(None),
        }
    }

    /// Wait for the confirmation to clear. The clipboard contents are served
    /// while the process is alive.
    pub async fn wait_copy_cleared(&self) -> Result<()> {
        self.handle.wait_for(|s| !s.copied).await?;
        Ok(())
    }

    /// Mount the settings screen and wait for the stored values
    pub async fn open_settings(&self) -> Result<ViewSnapshot> {
        self.handle.open_settings()?;
        let snapshot = self
            .handle
            .wait_for(|s| s.settings.as_ref().is_some_and(|form| !form.loading))
            .await?;
        Ok(snapshot)
    }

    /// Type `draft` into the mounted form and wait until the engine holds it
    pub async fn fill(&self, draft: &SettingsDraft) -> Result<()> {
        for field in SettingsField::ALL {
            self.handle.edit(field, draft.get(field))?;
        }
        self.handle
            .wait_for(|s| s.settings.as_ref().is_some_and(|form| form.draft == *draft))
            .await?;
        Ok(())
    }

    /// Submit the form and wait for the outcome
    ///
    /// Returns true once the save succeeded and the engine returned to the
    /// main screen, false if the backend rejected it.
    pub async fn save(&self, draft: ValidatedDraft) -> Result<bool> {
        let mut rx = self.handle.watch();
        rx.borrow_and_update();
        self.handle.submit_settings(draft)?;

        loop {
            rx.changed().await.map_err(|_| Error::ChannelClosed)?;
            let outcome = save_outcome(&rx.borrow_and_update());
            if let Some(saved) = outcome {
                return Ok(saved);
            }
        }
    }

    pub fn shutdown(&self) {
        self.handle.shutdown();
    }
}

/// Tracks the connection states published after a start toggle
#[derive(Debug, Default)]
struct StartProgress {
    seen_starting: bool,
}

impl StartProgress {
    /// Returns the settled state, or None while the start is unresolved.
    /// A Disconnected published before Starting was seen is a change to
    /// something else (e.g. the local address) and does not settle.
    fn observe(&mut self, connection: ConnectionState) -> Option<ConnectionState> {
        match connection {
            ConnectionState::Connected => Some(connection),
            ConnectionState::Starting => {
                self.seen_starting = true;
                None
            }
            ConnectionState::Disconnected if self.seen_starting => Some(connection),
            ConnectionState::Disconnected => None,
        }
    }
}

/// Outcome of a submitted save as seen in the first publish after it
///
/// Success ends on the main screen; a rejection leaves the form open with
/// saving cleared.
fn save_outcome(snapshot: &ViewSnapshot) -> Option<bool> {
    if snapshot.screen == Some(Screen::Main) {
        return Some(true);
    }
    match snapshot.settings.as_ref() {
        Some(form) if !form.saving => Some(false),
        _ => None,
    }
}

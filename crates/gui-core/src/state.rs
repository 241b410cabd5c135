// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 resocks5 Contributors

//! Connection state reconciliation
//!
//! Three inputs write the connection state: results of the "is running"
//! query, results of start/stop commands, and pushed proxy events. Each
//! applies unconditionally, so whichever lands last wins. The backend owns
//! the truth and the UI only mirrors it.

use resocks5_common::{ProxyEvent, Result};

/// UI-visible connection state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// Proxy is not running (also the optimistic default before the first query)
    #[default]
    Disconnected,
    /// A start command issued from this UI is in flight
    Starting,
    /// Proxy is running
    Connected,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Starting)
    }
}

/// Command the connection core asks the runtime to issue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyCommand {
    Start,
    Stop,
}

/// Connection state machine
#[derive(Debug, Default)]
pub struct ConnectionCore {
    state: ConnectionState,
    start_in_flight: bool,
    stop_in_flight: bool,
    running_known: bool,
}

impl ConnectionCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether the most recent "is running" query has resolved
    pub fn running_known(&self) -> bool {
        self.running_known
    }

    pub fn in_flight(&self, command: ProxyCommand) -> bool {
        match command {
            ProxyCommand::Start => self.start_in_flight,
            ProxyCommand::Stop => self.stop_in_flight,
        }
    }

    /// A fresh "is running" query is about to be issued
    pub fn begin_query(&mut self) {
        self.running_known = false;
    }

    /// Handle the user's toggle intent
    ///
    /// Returns the command to issue, if any. At most one command per
    /// direction is in flight at a time.
    pub fn toggle(&mut self) -> Option<ProxyCommand> {
        match self.state {
            ConnectionState::Starting => {
                tracing::debug!("Toggle ignored while starting");
                None
            }
            ConnectionState::Disconnected if self.start_in_flight => {
                tracing::debug!("Toggle ignored: start already in flight");
                None
            }
            ConnectionState::Disconnected => {
                self.state = ConnectionState::Starting;
                self.start_in_flight = true;
                Some(ProxyCommand::Start)
            }
            ConnectionState::Connected if self.stop_in_flight => {
                tracing::debug!("Toggle ignored: stop already in flight");
                None
            }
            ConnectionState::Connected => {
                self.stop_in_flight = true;
                Some(ProxyCommand::Stop)
            }
        }
    }

    /// Apply the result of the "is running" query
    ///
    /// Overwrites whatever state is current, including state set by a push
    /// event that arrived while the query was pending. A failed query counts
    /// as "not running".
    pub fn apply_running(&mut self, result: Result<bool>) {
        self.running_known = true;
        self.state = match result {
            Ok(true) => ConnectionState::Connected,
            Ok(false) => ConnectionState::Disconnected,
            Err(e) => {
                tracing::warn!("Failed to query proxy status: {}", e);
                ConnectionState::Disconnected
            }
        };
    }

    pub fn apply_start_result(&mut self, result: Result<()>) {
        self.start_in_flight = false;
        self.state = match result {
            Ok(()) => {
                tracing::info!("Proxy started");
                ConnectionState::Connected
            }
            Err(e) => {
                tracing::error!("Failed to start proxy: {}", e);
                ConnectionState::Disconnected
            }
        };
    }

    /// Stop is best-effort: the UI never stays "connected" after a stop attempt
    pub fn apply_stop_result(&mut self, result: Result<()>) {
        self.stop_in_flight = false;
        match result {
            Ok(()) => tracing::info!("Proxy stopped"),
            Err(e) => tracing::error!("Failed to stop proxy: {}", e),
        }
        self.state = ConnectionState::Disconnected;
    }

    pub fn apply_event(&mut self, event: ProxyEvent) {
        tracing::debug!("Event {} while {:?}", event.event_name(), self.state);
        self.state = match event {
            ProxyEvent::Started => ConnectionState::Connected,
            ProxyEvent::Stopped => ConnectionState::Disconnected,
        };
    }
}

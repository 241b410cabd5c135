// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 resocks5 Contributors

// Settings record shared between the UI and the proxy backend

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Upstream SOCKS5 server settings, as persisted by the backend.
///
/// Field names follow the backend's JSON record (`serverAddress`, ...).
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Whether the proxy should be running; owned by the backend, carried
    /// through verbatim by the settings screen
    #[serde(default)]
    pub enabled: bool,
    /// Upstream SOCKS5 server host or IP
    #[serde(default)]
    pub server_address: String,
    /// Upstream SOCKS5 server port
    #[serde(default)]
    pub server_port: u16,
    /// Upstream login
    #[serde(default)]
    pub server_login: String,
    /// Upstream password
    #[serde(default)]
    pub server_password: String,
}

impl Settings {
    /// Validate the record before it is sent to the backend
    pub fn validate(&self) -> Result<()> {
        if self.server_address.trim().is_empty() {
            return Err(Error::Config("Server address cannot be empty".into()));
        }

        if self.server_port == 0 {
            return Err(Error::Config("Server port must be between 1 and 65535".into()));
        }

        if self.server_login.is_empty() {
            return Err(Error::Config("Login cannot be empty".into()));
        }

        if self.server_password.is_empty() {
            return Err(Error::Config("Password cannot be empty".into()));
        }

        Ok(())
    }

    /// Upstream endpoint as `host:port`
    pub fn server_endpoint(&self) -> String {
        crate::format_host_port(&self.server_address, self.server_port)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("enabled", &self.enabled)
            .field("server_address", &self.server_address)
            .field("server_port", &self.server_port)
            .field("server_login", &self.server_login)
            .field("server_password", &"<redacted>")
            .finish()
    }
}

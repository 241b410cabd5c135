// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 resocks5 Contributors

// resocks5 - Backend Client Module
// Shared backend connection settings for the CLI and GUI core

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Header carrying the backend auth token
pub const AUTH_HEADER: &str = "X-Resocks5-Token";

/// Client configuration for connecting to the proxy backend
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BackendClientConfig {
    /// Backend host (e.g., "127.0.0.1")
    #[serde(default = "default_backend_host")]
    pub backend_host: String,

    /// Backend control port
    #[serde(default = "default_backend_port")]
    pub backend_port: u16,

    /// Authentication token (if the backend requires one)
    #[serde(default)]
    pub auth_token: String,

    /// Optional per-request timeout in seconds; commands wait indefinitely
    /// when unset. The event stream is never subject to it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

fn default_backend_host() -> String {
    "127.0.0.1".to_string()
}

fn default_backend_port() -> u16 {
    56790
}

impl Default for BackendClientConfig {
    fn default() -> Self {
        Self {
            backend_host: default_backend_host(),
            backend_port: default_backend_port(),
            auth_token: String::new(),
            request_timeout_secs: None,
        }
    }
}

impl BackendClientConfig {
    /// Base URL for API requests
    pub fn backend_base_url(&self) -> String {
        format!(
            "http://{}",
            crate::format_host_port(&self.backend_host, self.backend_port)
        )
    }

    /// Load configuration from `path`, falling back to defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No client config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read client config {}", path.display()))?;

        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse client config {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }
}

/// Get the path to the client configuration file
pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    Ok(config_dir.join("resocks5").join("client.toml"))
}

/// Validate backend client configuration completeness
pub fn validate_client_config(config: &BackendClientConfig) -> Result<()> {
    if config.backend_host.trim().is_empty() {
        anyhow::bail!("backend_host is required but is empty");
    }

    if config.backend_port == 0 {
        anyhow::bail!("backend_port must be greater than 0");
    }

    if !crate::is_loopback_address(&config.backend_host) && config.auth_token.is_empty() {
        anyhow::bail!(
            "Backend {} is not a loopback address; an auth_token is required",
            config.backend_host
        );
    }

    Ok(())
}

/// Create an HTTP client configured to talk to the backend
///
/// The request timeout applies only when configured, and never to
/// `streaming` clients.
pub fn create_backend_client(config: &BackendClientConfig, streaming: bool) -> Result<Client> {
    let mut client_builder = Client::builder();

    if let (false, Some(secs)) = (streaming, config.request_timeout_secs) {
        client_builder = client_builder.timeout(Duration::from_secs(secs));
    }

    client_builder
        .build()
        .context("Failed to build backend client")
}

/// Add authentication header to request if configured
pub fn add_auth_header(
    request: reqwest::RequestBuilder,
    config: &BackendClientConfig,
) -> reqwest::RequestBuilder {
    if !config.auth_token.is_empty() {
        request.header(AUTH_HEADER, &config.auth_token)
    } else {
        request
    }
}

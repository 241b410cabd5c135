// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 resocks5 Contributors

//! Backend command surface
//!
//! The engine only talks to the proxy backend through [`ProxyBackend`].
//! [`BackendClient`] implements it over the backend's REST API.

pub mod client;
pub mod config;

use async_trait::async_trait;
use resocks5_common::{Result, Settings};

pub use client::BackendClient;
pub use config::load_backend_config;

/// Request/response operations exposed by the proxy backend. Each call is
/// independently failable and none is cancellable.
#[async_trait]
pub trait ProxyBackend: Send + Sync {
    async fn get_settings(&self) -> Result<Settings>;

    async fn save_settings(&self, settings: Settings) -> Result<()>;

    async fn start_proxy(&self) -> Result<()>;

    async fn stop_proxy(&self) -> Result<()>;

    async fn is_proxy_running(&self) -> Result<bool>;

    async fn get_local_address(&self) -> Result<String>;
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 resocks5 Contributors

// resocks5 - Common Library
// Shared types, backend connection settings, and event stream

pub mod backend_client;
pub mod config;
pub mod error;
pub mod network;
pub mod sse;
pub mod types;

pub use backend_client::{
    add_auth_header, config_path, create_backend_client, validate_client_config,
    BackendClientConfig, AUTH_HEADER,
};
pub use config::Settings;
pub use error::{Error, Result};
pub use network::{format_host_port, is_loopback_address};
pub use sse::{parse_sse_message, EventListener};
pub use types::{ProxyEvent, DEFAULT_LOCAL_ADDRESS};

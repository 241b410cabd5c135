// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 resocks5 Contributors

//! Backend connection configuration helpers

use std::path::Path;

use anyhow::{Context, Result};
use resocks5_common::{validate_client_config, BackendClientConfig};

/// Load and validate the backend client configuration
///
/// Uses `path` when given, otherwise the default location. A missing file
/// yields the defaults.
pub fn load_backend_config(path: Option<&Path>) -> Result<BackendClientConfig> {
    let config = match path {
        Some(path) => BackendClientConfig::load_from(path)?,
        None => BackendClientConfig::load()?,
    };

    validate_client_config(&config).context("Invalid backend client configuration")?;

    tracing::debug!("Backend at {}", config.backend_base_url());
    Ok(config)
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 resocks5 Contributors

//! Backend client for proxy control operations

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use resocks5_common::{
    add_auth_header, create_backend_client, BackendClientConfig, Error, Result, Settings,
};

use super::ProxyBackend;

/// REST client for the proxy backend
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    pub config: BackendClientConfig,
}

/// Error response from backend API
#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Proxy status response
#[derive(Debug, Deserialize, Serialize)]
pub struct StatusResponse {
    pub running: bool,
}

/// Local address response
#[derive(Debug, Deserialize, Serialize)]
pub struct AddressResponse {
    pub address: String,
}

impl BackendClient {
    /// Create a backend client with custom configuration
    pub fn with_config(config: BackendClientConfig) -> anyhow::Result<Self> {
        let client = create_backend_client(&config, false)?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.backend_base_url(), path)
    }

    /// Turn a non-success response into an error carrying the backend's message
    async fn check(response: Response, action: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match response.json::<ErrorResponse>().await {
            Ok(body) => Err(Error::Backend(format!("{}: {}", action, body.error))),
            Err(_) => Err(Error::UnexpectedStatus {
                status: status.as_u16(),
                message: action.to_string(),
            }),
        }
    }
}

#[async_trait]
impl ProxyBackend for BackendClient {
    async fn get_settings(&self) -> Result<Settings> {
        let request = add_auth_header(self.client.get(self.url("/api/settings")), &self.config);
        let response = Self::check(request.send().await?, "Failed to get settings").await?;
        Ok(response.json().await?)
    }

    async fn save_settings(&self, settings: Settings) -> Result<()> {
        settings.validate()?;
        tracing::debug!("Saving settings for {}", settings.server_endpoint());

        let request = add_auth_header(self.client.put(self.url("/api/settings")), &self.config);
        let response = request.json(&settings).send().await?;
        Self::check(response, "Failed to save settings").await?;
        Ok(())
    }

    async fn start_proxy(&self) -> Result<()> {
        let request = add_auth_header(self.client.post(self.url("/api/proxy/start")), &self.config);
        Self::check(request.send().await?, "Failed to start proxy").await?;
        Ok(())
    }

    async fn stop_proxy(&self) -> Result<()> {
        let request = add_auth_header(self.client.post(self.url("/api/proxy/stop")), &self.config);
        Self::check(request.send().await?, "Failed to stop proxy").await?;
        Ok(())
    }

    async fn is_proxy_running(&self) -> Result<bool> {
        let request = add_auth_header(self.client.get(self.url("/api/proxy/status")), &self.config);
        let response = Self::check(request.send().await?, "Failed to get proxy status").await?;
        let status: StatusResponse = response.json().await?;
        Ok(status.running)
    }

    async fn get_local_address(&self) -> Result<String> {
        let request =
            add_auth_header(self.client.get(self.url("/api/proxy/address")), &self.config);
        let response = Self::check(request.send().await?, "Failed to get local address").await?;
        let address: AddressResponse = response.json().await?;
        Ok(address.address)
    }
}

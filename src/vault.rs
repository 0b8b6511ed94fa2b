//! Vault KV v2 client for credential storage.

use async_trait::async_trait;
use mockall::automock;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

/// JSON object payload stored at a secret path.
pub type SecretData = Map<String, Value>;

/// Configuration for connecting to a Vault/OpenBao instance.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Vault server address, e.g. `"http://localhost:8200"`.
    pub addr: String,

    /// Vault authentication token.
    pub token: String,

    /// KV v2 mount to store credentials under.
    pub mount: String,

    /// Request timeout applied to every backend call.
    pub timeout: Duration,
}

/// Hierarchical secret storage consumed by the credential store.
///
/// Paths are relative to the configured mount, e.g. `"{owner_id}/CUSTOS"`.
#[automock]
#[async_trait]
pub trait SecretBackend: Send + Sync {
    /// Write a secret payload at `path`, replacing any existing value.
    async fn write(&self, path: &str, value: &SecretData) -> Result<(), VaultError>;

    /// Read the payload at `path`, or `None` if nothing is stored there.
    async fn read(&self, path: &str) -> Result<Option<SecretData>, VaultError>;

    /// List the child key names directly under `path`.
    async fn list(&self, path: &str) -> Result<Vec<String>, VaultError>;

    /// Delete the secret at `path` and all of its versions.
    async fn delete(&self, path: &str) -> Result<(), VaultError>;
}

/// HTTP client for the Vault KV v2 secrets engine.
#[derive(Debug, Clone)]
pub struct VaultKvClient {
    config: VaultConfig,
    http: Client,
}

impl VaultKvClient {
    /// Create a new client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: VaultConfig) -> Result<Self, VaultError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(VaultError::Http)?;

        Ok(Self { config, http })
    }

    fn data_url(&self, path: &str) -> String {
        format!("{}/v1/{}/data/{path}", self.config.addr, self.config.mount)
    }

    fn metadata_url(&self, path: &str) -> String {
        format!(
            "{}/v1/{}/metadata/{path}",
            self.config.addr, self.config.mount
        )
    }
}

#[async_trait]
impl SecretBackend for VaultKvClient {
    async fn write(&self, path: &str, value: &SecretData) -> Result<(), VaultError> {
        let body = serde_json::json!({ "data": value });

        let response = self
            .http
            .post(self.data_url(path))
            .header("X-Vault-Token", &self.config.token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(unexpected("write", path, response).await);
        }

        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Option<SecretData>, VaultError> {
        let response = self
            .http
            .get(self.data_url(path))
            .header("X-Vault-Token", &self.config.token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(unexpected("read", path, response).await);
        }

        let parsed: ReadResponse = response.json().await?;

        Ok(Some(parsed.data.data))
    }

    async fn list(&self, path: &str) -> Result<Vec<String>, VaultError> {
        let response = self
            .http
            .get(format!("{}?list=true", self.metadata_url(path)))
            .header("X-Vault-Token", &self.config.token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        if !response.status().is_success() {
            return Err(unexpected("list", path, response).await);
        }

        let parsed: ListResponse = response.json().await?;

        Ok(parsed.data.keys)
    }

    async fn delete(&self, path: &str) -> Result<(), VaultError> {
        let response = self
            .http
            .delete(self.metadata_url(path))
            .header("X-Vault-Token", &self.config.token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }

        if !response.status().is_success() {
            return Err(unexpected("delete", path, response).await);
        }

        Ok(())
    }
}

async fn unexpected(operation: &str, path: &str, response: reqwest::Response) -> VaultError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    VaultError::UnexpectedResponse(format!(
        "{operation} {path} failed with status {status}: {text}"
    ))
}

#[derive(Debug, Deserialize)]
struct ReadResponse {
    data: ReadEnvelope,
}

#[derive(Debug, Deserialize)]
struct ReadEnvelope {
    data: SecretData,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    data: ListData,
}

#[derive(Debug, Deserialize)]
struct ListData {
    keys: Vec<String>,
}

/// Errors that can occur when communicating with the secret backend.
#[derive(Debug, Error)]
pub enum VaultError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend returned a non-2xx response or unexpected body.
    #[error("unexpected response from secret backend: {0}")]
    UnexpectedResponse(String),
}

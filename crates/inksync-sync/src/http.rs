//! Remote adapter: a [`VaultApi`] over the vault's HTTP interface.

use std::time::Duration;

use async_trait::async_trait;
use inksync_core::{ContentHash, FileState, PushReceipt, Update, Upload};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::api::VaultApi;
use crate::error::{Result, SyncError};
use crate::wire::{
    codes, encode_filepath, update_from_json, ErrorBody, FileResponse, UploadRequest,
};

/// Talks to a vault served by `inksync-server`.
#[derive(Debug, Clone)]
pub struct HttpVaultApi {
    client: reqwest::Client,
    base_url: String,
    vault: String,
}

impl HttpVaultApi {
    /// Create an adapter for `vault` on the server at `base_url`
    /// (e.g. `http://127.0.0.1:3000`). Every request is bounded by `timeout`.
    pub fn new(base_url: impl Into<String>, vault: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, base_url, vault))
    }

    /// Use a preconfigured client.
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        vault: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            vault: vault.into(),
        }
    }

    pub fn vault(&self) -> &str {
        &self.vault
    }

    fn url(&self, tail: &str) -> String {
        format!("{}/vaults/{}/{}", self.base_url, self.vault, tail)
    }

    fn file_url(&self, filepath: &str) -> String {
        self.url(&format!("files/{}", encode_filepath(filepath)))
    }

    /// Send a request and turn every non-2xx answer into an error.
    async fn send(&self, request: RequestBuilder, filepath: Option<&str>) -> Result<Response> {
        let response = request.send().await.map_err(classify)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let (message, code) = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(err) => (err.error, Some(err.code)),
            Err(_) => (body, None),
        };
        tracing::debug!(%status, ?code, %message, "vault returned error");

        if status == StatusCode::CONFLICT || code.as_deref() == Some(codes::STALE_BASE) {
            return Err(SyncError::StaleBase {
                filepath: filepath.unwrap_or_default().to_string(),
            });
        }
        let status_code = status.as_u16();
        if status.is_server_error() {
            Err(SyncError::Server {
                status: status_code,
                message,
            })
        } else {
            Err(SyncError::Rejected {
                status: status_code,
                message,
            })
        }
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T> {
        response.json::<T>().await.map_err(classify)
    }
}

fn classify(e: reqwest::Error) -> SyncError {
    if e.is_timeout() {
        SyncError::Timeout(e.to_string())
    } else if e.is_decode() {
        SyncError::InvalidResponse(e.to_string())
    } else {
        SyncError::Transport(e.to_string())
    }
}

#[async_trait]
impl VaultApi for HttpVaultApi {
    async fn ping(&self) -> Result<String> {
        let response = self.send(self.client.get(self.url("ping")), None).await?;
        response.text().await.map_err(classify)
    }

    async fn updates_since(&self, time: i64) -> Result<Vec<Update>> {
        let request = self.client.get(self.url("updates")).query(&[("since", time)]);
        let response = self.send(request, None).await?;
        Self::json(response).await
    }

    async fn upload_file(
        &self,
        filepath: &str,
        current_hash: Option<&ContentHash>,
        upload: Upload,
    ) -> Result<PushReceipt> {
        let body = UploadRequest::new(current_hash, &upload);
        let request = self.client.post(self.file_url(filepath)).json(&body);
        let response = self.send(request, Some(filepath)).await?;
        Self::json(response).await
    }

    async fn get_file(&self, filepath: &str) -> Result<FileState> {
        let response = self
            .send(self.client.get(self.file_url(filepath)), Some(filepath))
            .await?;
        let body: FileResponse = Self::json(response).await?;
        Ok(FileState::try_from(body)?)
    }

    async fn get_update(&self, filepath: &str) -> Result<Option<Update>> {
        let url = self.url(&format!("updates/{}", encode_filepath(filepath)));
        let response = self.send(self.client.get(url), Some(filepath)).await?;
        let body: serde_json::Value = Self::json(response).await?;
        Ok(update_from_json(body)?)
    }
}

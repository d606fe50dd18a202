//! Google Drive v3 implementation of [`ObjectStore`].

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use nela_gcp_auth::{AccessToken, ServiceAccount, TokenProvider};
use reqwest::{Response, StatusCode, Url};
use serde::Deserialize;

use crate::{ByteStream, FileMetadata, ObjectSession, ObjectStore, Result, StoreError};

/// Drive v3 API root.
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/drive/v3";

/// Fields requested from the metadata endpoint.
const METADATA_FIELDS: &str = "name,mimeType,size";

/// Drive reports `size` as a decimal string; tolerate a number too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SizeField {
    Number(u64),
    Text(String),
}

impl SizeField {
    fn bytes(self) -> Option<u64> {
        match self {
            SizeField::Number(n) => Some(n),
            SizeField::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    name: Option<String>,
    mime_type: Option<String>,
    size: Option<SizeField>,
}

impl From<DriveFile> for FileMetadata {
    fn from(file: DriveFile) -> Self {
        FileMetadata {
            name: file.name.filter(|n| !n.is_empty()),
            mime_type: file.mime_type.filter(|m| !m.is_empty()),
            size: file.size.and_then(SizeField::bytes),
        }
    }
}

/// Google Drive store authenticated with a service account.
#[derive(Clone, Debug)]
pub struct DriveStore {
    tokens: TokenProvider,
    http: reqwest::Client,
    base_url: Arc<Url>,
}

impl DriveStore {
    /// Create a store against the public Drive API.
    pub fn new(account: Arc<ServiceAccount>) -> Result<Self> {
        Self::with_base_url(account, DEFAULT_BASE_URL)
    }

    /// Create a store against an alternative API root.
    pub fn with_base_url(account: Arc<ServiceAccount>, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| StoreError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::InvalidBaseUrl(base_url.to_string()));
        }

        let http = reqwest::Client::new();
        Ok(Self {
            tokens: TokenProvider::with_client(account, http.clone()),
            http,
            base_url: Arc::new(base_url),
        })
    }

    /// The API root this store talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl ObjectStore for DriveStore {
    type Session = DriveSession;

    async fn connect(&self) -> Result<DriveSession> {
        let token = self.tokens.fetch_token().await?;
        tracing::debug!(expires_in = token.expires_in, "Drive session authenticated");
        Ok(DriveSession {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            token,
        })
    }
}

/// A Drive session carrying one bearer token.
#[derive(Debug)]
pub struct DriveSession {
    http: reqwest::Client,
    base_url: Arc<Url>,
    token: AccessToken,
}

impl DriveSession {
    fn file_url(&self, file_id: &str) -> Result<Url> {
        if file_id.is_empty() {
            return Err(StoreError::InvalidId(file_id.to_string()));
        }

        let mut url = Url::clone(&self.base_url);
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidId(file_id.to_string()))?
            .pop_if_empty()
            .push("files")
            .push(file_id);
        Ok(url)
    }

    async fn get(&self, file_id: &str, query: &[(&str, &str)]) -> Result<Response> {
        let response = self
            .http
            .get(self.file_url(file_id)?)
            .bearer_auth(&self.token.token)
            .query(query)
            .send()
            .await?;

        check_status(response, file_id).await
    }
}

#[async_trait]
impl ObjectSession for DriveSession {
    async fn metadata(&self, file_id: &str) -> Result<FileMetadata> {
        let response = self
            .get(
                file_id,
                &[("fields", METADATA_FIELDS), ("supportsAllDrives", "true")],
            )
            .await?;

        let file: DriveFile = response.json().await?;
        Ok(file.into())
    }

    async fn open(&self, file_id: &str) -> Result<ByteStream> {
        let response = self
            .get(file_id, &[("alt", "media"), ("supportsAllDrives", "true")])
            .await?;

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(StoreError::from))
            .boxed())
    }
}

/// Map non-success statuses to errors, logging the provider's body.
async fn check_status(response: Response, file_id: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(
        file_id,
        status = status.as_u16(),
        body = %body,
        "Drive request failed"
    );

    if status == StatusCode::NOT_FOUND {
        Err(StoreError::NotFound {
            file_id: file_id.to_string(),
        })
    } else {
        Err(StoreError::Status {
            status: status.as_u16(),
            file_id: file_id.to_string(),
        })
    }
}

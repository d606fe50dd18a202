//! Error types for the download proxy.

use std::path::PathBuf;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use nela_drive::StoreError;
use thiserror::Error;

/// Body sent when the `fileId` query parameter is absent or empty.
pub const MISSING_FILE_ID: &str = "Missing fileId";
/// Body sent for every failure before streaming starts.
pub const DOWNLOAD_FAILED: &str = "Download failed";
/// Body sent when a catalog route names no known artifact.
pub const UNKNOWN_DOWNLOAD: &str = "Unknown download";
/// Body sent for unmatched routes.
pub const NOT_FOUND: &str = "Not found";

/// Result type alias for nela-download operations.
pub type Result<T> = std::result::Result<T, ProxyError>;

/// Errors surfaced by the download routes before the response is committed.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ProxyError {
    /// The request carried no usable file id.
    #[error("missing fileId")]
    MissingFileId,

    /// No catalog entry for the requested kind/slug.
    #[error("unknown download: {kind}/{slug}")]
    UnknownDownload {
        /// Artifact kind (e.g. `models`).
        kind: String,
        /// Artifact slug (e.g. `small`).
        slug: String,
    },

    /// Authentication, metadata lookup or stream setup failed.
    #[error("upstream error: {0}")]
    Upstream(#[from] StoreError),

    /// The pre-stream phase did not finish within the configured limit.
    #[error("upstream setup timed out after {seconds}s")]
    Timeout {
        /// Configured limit in seconds.
        seconds: u64,
    },
}

impl ProxyError {
    /// The HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingFileId => StatusCode::BAD_REQUEST,
            ProxyError::UnknownDownload { .. } => StatusCode::NOT_FOUND,
            ProxyError::Upstream(_) | ProxyError::Timeout { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The client-facing message. Upstream details are never included.
    pub fn public_message(&self) -> &'static str {
        match self {
            ProxyError::MissingFileId => MISSING_FILE_ID,
            ProxyError::UnknownDownload { .. } => UNKNOWN_DOWNLOAD,
            ProxyError::Upstream(_) | ProxyError::Timeout { .. } => DOWNLOAD_FAILED,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Download error");
        } else {
            tracing::debug!(error = %self, "Download request rejected");
        }
        error_response(status, self.public_message())
    }
}

/// Build a `{ "error": <message> }` JSON response.
pub fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// Errors that can occur while loading the download catalog.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("failed to read catalog {path}: {source}")]
    Io {
        /// Path of the catalog file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The catalog is not valid TOML or does not match the schema.
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),

    /// Two entries share a kind/slug pair.
    #[error("duplicate catalog entry: {kind}/{slug}")]
    Duplicate {
        /// Artifact kind.
        kind: String,
        /// Artifact slug.
        slug: String,
    },

    /// An entry is missing a required value.
    #[error("catalog entry {kind}/{slug} has an empty {field}")]
    EmptyField {
        /// Artifact kind.
        kind: String,
        /// Artifact slug.
        slug: String,
        /// Name of the empty field.
        field: &'static str,
    },
}

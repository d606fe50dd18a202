//! Error types for object storage access.

use nela_gcp_auth::AuthError;

/// Result type alias for nela-drive operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while talking to the object storage provider.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// Obtaining request credentials failed.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// The provider has no object with this id.
    #[error("object not found: {file_id}")]
    NotFound {
        /// The requested object id.
        file_id: String,
    },

    /// The provider answered with an unexpected status.
    #[error("provider returned HTTP {status} for {file_id}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// The requested object id.
        file_id: String,
    },

    /// Transport-level failure (connect, TLS, read, body decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured API root is not a usable base URL.
    #[error("invalid provider base URL: {0}")]
    InvalidBaseUrl(String),

    /// The object id cannot be addressed.
    #[error("invalid object id: {0:?}")]
    InvalidId(String),

    /// The content stream failed after it was opened.
    #[error("content stream failed: {0}")]
    Stream(String),
}

impl StoreError {
    /// Creates a new stream error.
    pub fn stream<S: Into<String>>(message: S) -> Self {
        StoreError::Stream(message.into())
    }

    /// Whether the provider reported the object as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

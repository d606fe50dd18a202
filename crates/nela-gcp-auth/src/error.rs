//! Error types for service-account authentication.

/// Result type alias for nela-gcp-auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur while loading credentials or minting tokens.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AuthError {
    /// A required environment variable is unset or empty.
    #[error("missing environment variable: {0}")]
    MissingEnv(&'static str),

    /// The private key is not a valid RSA PEM key.
    #[error("invalid service-account private key: {0}")]
    InvalidKey(String),

    /// Signing the JWT assertion failed.
    #[error("failed to sign token assertion: {0}")]
    Signing(String),

    /// The token endpoint could not be reached or returned an unreadable body.
    #[error("token exchange failed: {0}")]
    Exchange(#[from] reqwest::Error),

    /// The token endpoint answered with a non-success status.
    #[error("token endpoint rejected assertion (HTTP {status}): {body}")]
    Rejected {
        /// HTTP status returned by the token endpoint.
        status: u16,
        /// Response body, as returned.
        body: String,
    },
}

impl AuthError {
    /// Whether this error is caused by local configuration rather than the
    /// remote token endpoint.
    pub fn is_config_error(&self) -> bool {
        matches!(self, AuthError::MissingEnv(_) | AuthError::InvalidKey(_))
    }
}

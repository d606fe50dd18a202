//! Service-account identity and JWT assertion signing.

use std::fmt;

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::Serialize;

use crate::{AuthError, Result};

/// Read-only Google Drive scope.
pub const DRIVE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";

/// Google's OAuth2 token endpoint.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Lifetime requested for each assertion, in seconds (Google's maximum).
pub const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Environment variable holding the service-account email.
pub const ENV_CLIENT_EMAIL: &str = "GOOGLE_CLIENT_EMAIL";
/// Environment variable holding the service-account private key.
pub const ENV_PRIVATE_KEY: &str = "GOOGLE_PRIVATE_KEY";
/// Optional environment variable overriding the token endpoint.
pub const ENV_TOKEN_URI: &str = "GOOGLE_TOKEN_URI";

/// Claims of the JWT-bearer assertion sent to the token endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct AssertionClaims<'a> {
    pub iss: &'a str,
    pub scope: &'a str,
    pub aud: &'a str,
    pub iat: i64,
    pub exp: i64,
}

/// A service-account credential.
///
/// Built once at startup and shared read-only for the lifetime of the
/// process. The private key is parsed on construction so a malformed key
/// fails at startup, not on the first request.
#[derive(Clone)]
pub struct ServiceAccount {
    client_email: String,
    scope: String,
    token_uri: String,
    key: EncodingKey,
}

impl ServiceAccount {
    /// Create a credential from an email, a PEM private key and a scope.
    ///
    /// Escaped `\n` sequences in the key are normalized first.
    pub fn new(
        client_email: impl Into<String>,
        private_key: &str,
        scope: impl Into<String>,
    ) -> Result<Self> {
        let pem = normalize_private_key(private_key);
        let key = EncodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| AuthError::InvalidKey(e.to_string()))?;

        Ok(Self {
            client_email: client_email.into(),
            scope: scope.into(),
            token_uri: DEFAULT_TOKEN_URI.to_string(),
            key,
        })
    }

    /// Load the read-only Drive credential from `GOOGLE_CLIENT_EMAIL`,
    /// `GOOGLE_PRIVATE_KEY` and the optional `GOOGLE_TOKEN_URI`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the credential through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(AuthError::MissingEnv(name))
        };

        let email = required(ENV_CLIENT_EMAIL)?;
        let key = required(ENV_PRIVATE_KEY)?;
        let account = Self::new(email, &key, DRIVE_READONLY_SCOPE)?;

        match lookup(ENV_TOKEN_URI).filter(|v| !v.trim().is_empty()) {
            Some(uri) => Ok(account.with_token_uri(uri)),
            None => Ok(account),
        }
    }

    /// Override the token endpoint.
    pub fn with_token_uri(mut self, token_uri: impl Into<String>) -> Self {
        self.token_uri = token_uri.into();
        self
    }

    /// The service-account email.
    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    /// The requested OAuth2 scope.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// The token endpoint the assertion is addressed to.
    pub fn token_uri(&self) -> &str {
        &self.token_uri
    }

    /// Sign a JWT-bearer assertion issued at `issued_at` (Unix seconds).
    pub fn assertion(&self, issued_at: i64) -> Result<String> {
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: &self.scope,
            aud: &self.token_uri,
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("client_email", &self.client_email)
            .field("scope", &self.scope)
            .field("token_uri", &self.token_uri)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Replace literal `\n` escapes with newlines.
///
/// Keys pasted into environment variables usually arrive on a single line.
pub fn normalize_private_key(key: &str) -> String {
    key.replace("\\n", "\n")
}

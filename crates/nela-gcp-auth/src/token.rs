//! OAuth2 JWT-bearer token exchange.

use std::sync::Arc;

use serde::Deserialize;

use crate::{AuthError, Result, ServiceAccount};

/// Grant type for the service-account JWT-bearer flow.
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// A short-lived bearer token minted from a service account.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// The bearer token value.
    pub token: String,
    /// Seconds until the token expires, as reported by the endpoint.
    pub expires_in: u64,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Mints access tokens for a shared, immutable [`ServiceAccount`].
///
/// Holds no token state: every call performs one exchange.
#[derive(Clone, Debug)]
pub struct TokenProvider {
    account: Arc<ServiceAccount>,
    http: reqwest::Client,
}

impl TokenProvider {
    /// Create a provider with its own HTTP client.
    pub fn new(account: Arc<ServiceAccount>) -> Self {
        Self::with_client(account, reqwest::Client::new())
    }

    /// Create a provider that reuses an existing HTTP client.
    pub fn with_client(account: Arc<ServiceAccount>, http: reqwest::Client) -> Self {
        Self { account, http }
    }

    /// The credential this provider signs with.
    pub fn account(&self) -> &ServiceAccount {
        &self.account
    }

    /// Exchange a freshly signed assertion for an access token.
    pub async fn fetch_token(&self) -> Result<AccessToken> {
        let assertion = self.account.assertion(chrono::Utc::now().timestamp())?;

        tracing::debug!(
            client_email = %self.account.client_email(),
            token_uri = %self.account.token_uri(),
            "Requesting service-account access token"
        );

        let response = self
            .http
            .post(self.account.token_uri())
            .form(&[
                ("grant_type", JWT_BEARER_GRANT),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TokenResponse = response.json().await?;
        Ok(AccessToken {
            token: parsed.access_token,
            expires_in: parsed.expires_in.unwrap_or(0),
        })
    }
}

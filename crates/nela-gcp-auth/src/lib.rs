//! Google service-account authentication for the NELA download service.
//!
//! Provides:
//! - [`ServiceAccount`]: immutable credential loaded once at startup
//! - [`TokenProvider`]: mints short-lived bearer tokens via the JWT-bearer flow
//! - [`AuthError`]: credential and token-exchange errors

mod credentials;
mod error;
mod token;

pub use credentials::{
    ASSERTION_LIFETIME_SECS, DEFAULT_TOKEN_URI, DRIVE_READONLY_SCOPE, ENV_CLIENT_EMAIL,
    ENV_PRIVATE_KEY, ENV_TOKEN_URI, ServiceAccount, normalize_private_key,
};
pub use error::{AuthError, Result};
pub use token::{AccessToken, JWT_BEARER_GRANT, TokenProvider};

//! # nela-download
//!
//! Streaming download proxy for the NELA site.
//!
//! `GET /api/download?fileId=<id>` authenticates to the object store, looks up
//! the object's metadata, opens its content and relays it to the client chunk
//! by chunk. Named installers and model files are served from a [`Catalog`]
//! at `GET /downloads/{kind}/{slug}`.

#![forbid(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod headers;
pub mod relay;
pub mod routes;

#[cfg(test)]
mod testing;

pub use catalog::{Artifact, Catalog, CatalogListing};
pub use error::{CatalogError, ProxyError, Result};
pub use relay::{RelayStream, TransferPhase};
pub use routes::{AppState, DEFAULT_SETUP_TIMEOUT, FILE_ID_PARAM, file_id_param, proxy_download, router};

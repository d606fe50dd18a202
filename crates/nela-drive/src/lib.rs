//! Object storage access for the NELA download service.
//!
//! The download proxy depends only on the [`ObjectStore`] / [`ObjectSession`]
//! traits; [`DriveStore`] is the Google Drive v3 implementation used in
//! production.

mod drive;
mod error;
mod store;

pub use drive::{DEFAULT_BASE_URL, DriveSession, DriveStore};
pub use error::{Result, StoreError};
pub use store::{ByteStream, FileMetadata, ObjectSession, ObjectStore};

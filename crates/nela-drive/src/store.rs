//! The object storage seam consumed by the download proxy.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::Result;

/// An object's content as an incremental sequence of chunks.
///
/// Consumed at most once. Dropping it releases the underlying connection.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Metadata describing a stored object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMetadata {
    /// Display filename.
    pub name: Option<String>,
    /// MIME type.
    pub mime_type: Option<String>,
    /// Size in bytes, when the provider reports one.
    pub size: Option<u64>,
}

impl FileMetadata {
    /// Creates metadata with all fields known.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            name: Some(name.into()),
            mime_type: Some(mime_type.into()),
            size: Some(size),
        }
    }
}

/// An object storage provider.
///
/// `connect` performs authentication and yields a session whose calls all
/// carry the same request credentials.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Authenticated session type.
    type Session: ObjectSession;

    /// Authenticate and open a session.
    async fn connect(&self) -> Result<Self::Session>;
}

/// An authenticated session against an [`ObjectStore`].
#[async_trait]
pub trait ObjectSession: Send + Sync {
    /// Look up metadata for an object.
    async fn metadata(&self, file_id: &str) -> Result<FileMetadata>;

    /// Open the object's content as a streamed read.
    ///
    /// Returns once the provider has accepted the request; bytes are pulled
    /// lazily from the returned stream.
    async fn open(&self, file_id: &str) -> Result<ByteStream>;
}

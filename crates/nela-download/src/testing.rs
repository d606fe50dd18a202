//! In-memory object store for route tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream;
use nela_drive::{ByteStream, FileMetadata, ObjectSession, ObjectStore, StoreError};

/// Chunk size used when serving content.
pub const CHUNK: usize = 512;

#[derive(Clone)]
enum Behavior {
    Serve(FileMetadata, Bytes),
    FailMetadata,
    StallConnect,
}

/// Call counters shared between a [`MockStore`] and the test.
#[derive(Default)]
pub struct Calls {
    connect: AtomicUsize,
    metadata: AtomicUsize,
    open: AtomicUsize,
    last_file_id: Mutex<Option<String>>,
}

#[allow(clippy::unwrap_used)]
impl Calls {
    pub fn connect(&self) -> usize {
        self.connect.load(Ordering::SeqCst)
    }

    pub fn metadata(&self) -> usize {
        self.metadata.load(Ordering::SeqCst)
    }

    pub fn open(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.connect() + self.metadata() + self.open()
    }

    pub fn last_file_id(&self) -> Option<String> {
        self.last_file_id.lock().unwrap().clone()
    }

    fn saw(&self, file_id: &str) {
        *self.last_file_id.lock().unwrap() = Some(file_id.to_string());
    }
}

pub struct MockStore {
    behavior: Behavior,
    calls: Arc<Calls>,
}

impl MockStore {
    pub fn with_content(metadata: FileMetadata, content: Vec<u8>) -> Self {
        Self::new(Behavior::Serve(metadata, Bytes::from(content)))
    }

    pub fn failing_metadata() -> Self {
        Self::new(Behavior::FailMetadata)
    }

    pub fn stalled_connect() -> Self {
        Self::new(Behavior::StallConnect)
    }

    fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(Calls::default()),
        }
    }

    pub fn calls(&self) -> Arc<Calls> {
        self.calls.clone()
    }
}

pub struct MockSession {
    behavior: Behavior,
    calls: Arc<Calls>,
}

#[async_trait]
impl ObjectStore for MockStore {
    type Session = MockSession;

    async fn connect(&self) -> nela_drive::Result<MockSession> {
        self.calls.connect.fetch_add(1, Ordering::SeqCst);
        if let Behavior::StallConnect = self.behavior {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        Ok(MockSession {
            behavior: self.behavior.clone(),
            calls: self.calls.clone(),
        })
    }
}

#[async_trait]
impl ObjectSession for MockSession {
    async fn metadata(&self, file_id: &str) -> nela_drive::Result<FileMetadata> {
        self.calls.metadata.fetch_add(1, Ordering::SeqCst);
        self.calls.saw(file_id);
        match &self.behavior {
            Behavior::Serve(metadata, _) => Ok(metadata.clone()),
            _ => Err(StoreError::NotFound {
                file_id: file_id.to_string(),
            }),
        }
    }

    async fn open(&self, file_id: &str) -> nela_drive::Result<ByteStream> {
        self.calls.open.fetch_add(1, Ordering::SeqCst);
        self.calls.saw(file_id);
        match &self.behavior {
            Behavior::Serve(_, content) => {
                let chunks: Vec<nela_drive::Result<Bytes>> = (0..content.len())
                    .step_by(CHUNK)
                    .map(|start| Ok(content.slice(start..(start + CHUNK).min(content.len()))))
                    .collect();
                Ok(stream::iter(chunks).boxed())
            }
            _ => Err(StoreError::stream("no content")),
        }
    }
}

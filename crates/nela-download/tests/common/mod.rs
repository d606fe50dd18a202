//! Common test utilities for download proxy integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use nela_download::{AppState, Catalog, router};
use nela_drive::{ByteStream, FileMetadata, ObjectSession, ObjectStore, StoreError};
use tower::ServiceExt;

/// Produces a fresh upstream stream for each `open` call.
pub type ContentFactory = Arc<dyn Fn() -> ByteStream + Send + Sync>;

/// What a [`ScriptedStore`] serves.
#[derive(Clone)]
pub struct Script {
    /// `None` makes the metadata call fail.
    pub metadata: Option<FileMetadata>,
    /// `None` makes the open call fail.
    pub content: Option<ContentFactory>,
}

/// Call counters shared between a store and the test.
#[derive(Default)]
pub struct Calls {
    pub connect: AtomicUsize,
    pub metadata: AtomicUsize,
    pub open: AtomicUsize,
}

impl Calls {
    pub fn total(&self) -> usize {
        self.connect.load(Ordering::SeqCst)
            + self.metadata.load(Ordering::SeqCst)
            + self.open.load(Ordering::SeqCst)
    }
}

/// An object store driven by a [`Script`].
pub struct ScriptedStore {
    script: Arc<Script>,
    pub calls: Arc<Calls>,
}

impl ScriptedStore {
    pub fn new(script: Script) -> Self {
        Self {
            script: Arc::new(script),
            calls: Arc::new(Calls::default()),
        }
    }

    /// Serve `content` in `chunk`-sized pieces.
    pub fn serving(metadata: FileMetadata, content: Vec<u8>, chunk: usize) -> Self {
        let content = Bytes::from(content);
        Self::new(Script {
            metadata: Some(metadata),
            content: Some(Arc::new(move || chunked(content.clone(), chunk))),
        })
    }
}

pub struct ScriptedSession {
    script: Arc<Script>,
    calls: Arc<Calls>,
}

#[async_trait]
impl ObjectStore for ScriptedStore {
    type Session = ScriptedSession;

    async fn connect(&self) -> nela_drive::Result<ScriptedSession> {
        self.calls.connect.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedSession {
            script: self.script.clone(),
            calls: self.calls.clone(),
        })
    }
}

#[async_trait]
impl ObjectSession for ScriptedSession {
    async fn metadata(&self, file_id: &str) -> nela_drive::Result<FileMetadata> {
        self.calls.metadata.fetch_add(1, Ordering::SeqCst);
        self.script
            .metadata
            .clone()
            .ok_or_else(|| StoreError::NotFound {
                file_id: file_id.to_string(),
            })
    }

    async fn open(&self, file_id: &str) -> nela_drive::Result<ByteStream> {
        self.calls.open.fetch_add(1, Ordering::SeqCst);
        match &self.script.content {
            Some(factory) => Ok(factory()),
            None => Err(StoreError::Status {
                status: 500,
                file_id: file_id.to_string(),
            }),
        }
    }
}

/// Split `content` into a stream of `chunk`-sized pieces.
pub fn chunked(content: Bytes, chunk: usize) -> ByteStream {
    let pieces: Vec<nela_drive::Result<Bytes>> = (0..content.len())
        .step_by(chunk)
        .map(|start| Ok(content.slice(start..(start + chunk).min(content.len()))))
        .collect();
    stream::iter(pieces).boxed()
}

/// Sets a flag when dropped, standing in for an upstream connection.
pub struct ReleaseGuard(pub Arc<AtomicBool>);

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// An endless stream of `chunk` that flips `released` when dropped.
pub fn endless(chunk: Bytes, released: Arc<AtomicBool>) -> ByteStream {
    stream::unfold(ReleaseGuard(released), move |guard| {
        let chunk = chunk.clone();
        async move { Some((Ok::<_, StoreError>(chunk), guard)) }
    })
    .boxed()
}

/// Build the router around a store and catalog.
pub fn app<S: ObjectStore>(store: S, catalog: Catalog) -> Router {
    router(Arc::new(AppState::new(store).with_catalog(catalog)))
}

/// Issue a GET request.
pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Collect a response body.
pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

/// The response body as a chunk stream.
pub fn body_stream(response: Response) -> BoxStream<'static, Result<Bytes, axum::Error>> {
    response.into_body().into_data_stream().boxed()
}

/// Deterministic pseudo-random payload.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i.wrapping_mul(31) % 251) as u8).collect()
}

//! HTTP routes and the download proxy pipeline.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use nela_drive::{ByteStream, FileMetadata, ObjectSession, ObjectStore};
use tower_http::trace::TraceLayer;

use crate::catalog::{Catalog, CatalogListing};
use crate::error::{NOT_FOUND, ProxyError, Result, error_response};
use crate::headers::download_headers;
use crate::relay::{RelayStream, TransferPhase};

/// Default limit for authentication, metadata lookup and stream setup.
pub const DEFAULT_SETUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared, read-only state for every request.
pub struct AppState<S> {
    store: S,
    catalog: Catalog,
    setup_timeout: Duration,
}

impl<S: ObjectStore> AppState<S> {
    /// Create state with an empty catalog and the default setup timeout.
    pub fn new(store: S) -> Self {
        Self {
            store,
            catalog: Catalog::empty(),
            setup_timeout: DEFAULT_SETUP_TIMEOUT,
        }
    }

    /// Replace the download catalog.
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Replace the setup timeout.
    pub fn with_setup_timeout(mut self, timeout: Duration) -> Self {
        self.setup_timeout = timeout;
        self
    }

    /// The object store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The download catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

/// Query parameter carrying the provider file id.
pub const FILE_ID_PARAM: &str = "fileId";

/// The first `fileId` value in a query string's pairs, unless it is empty.
///
/// Repeated keys and unrelated parameters are ignored, so any query string
/// yields either an id or a JSON 400 from the handler.
pub fn file_id_param(pairs: Vec<(String, String)>) -> Option<String> {
    pairs
        .into_iter()
        .find(|(key, _)| key == FILE_ID_PARAM)
        .map(|(_, value)| value)
        .filter(|id| !id.is_empty())
}

/// Build the application router.
pub fn router<S: ObjectStore>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/api/download", get(download::<S>))
        .route("/api/downloads", get(list_downloads::<S>))
        .route("/downloads/{kind}/{slug}", get(download_named::<S>))
        .route("/healthz", get(health_check))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `GET /api/download?fileId=<id>`
#[tracing::instrument(skip(state, query), fields(file_id = tracing::field::Empty))]
async fn download<S: ObjectStore>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Response> {
    tracing::debug!(phase = ?TransferPhase::Idle, "Download request received");
    tracing::debug!(phase = ?TransferPhase::ValidatingInput, "Validating download request");
    let file_id = file_id_param(query).ok_or(ProxyError::MissingFileId)?;
    tracing::Span::current().record("file_id", file_id.as_str());

    proxy_download(&state.store, &file_id, state.setup_timeout).await
}

/// `GET /downloads/{kind}/{slug}`
#[tracing::instrument(skip(state))]
async fn download_named<S: ObjectStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((kind, slug)): Path<(String, String)>,
) -> Result<Response> {
    let artifact = state
        .catalog
        .get(&kind, &slug)
        .ok_or(ProxyError::UnknownDownload { kind, slug })?;

    proxy_download(&state.store, &artifact.file_id, state.setup_timeout).await
}

/// `GET /api/downloads`
async fn list_downloads<S: ObjectStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<Vec<CatalogListing>> {
    Json(state.catalog.listing())
}

async fn health_check() -> &'static str {
    "ok"
}

async fn fallback(uri: Uri) -> Response {
    tracing::debug!(%uri, "No route matched");
    error_response(StatusCode::NOT_FOUND, NOT_FOUND)
}

/// Fetch metadata, open the content and return a streaming response.
///
/// Everything before the response is built is bounded by `setup_timeout`
/// and fails as a whole; once the response exists its headers are final and
/// later upstream failures abort the body instead.
pub async fn proxy_download<S: ObjectStore>(
    store: &S,
    file_id: &str,
    setup_timeout: Duration,
) -> Result<Response> {
    let (metadata, content) = tokio::time::timeout(setup_timeout, open_upstream(store, file_id))
        .await
        .map_err(|_| ProxyError::Timeout {
            seconds: setup_timeout.as_secs(),
        })??;

    tracing::info!(
        file_id,
        name = metadata.name.as_deref().unwrap_or_default(),
        size = metadata.size,
        phase = ?TransferPhase::StreamingBody,
        "Streaming download"
    );

    let headers = download_headers(&metadata);
    let body = Body::from_stream(RelayStream::new(file_id, content, metadata.size));
    Ok((StatusCode::OK, headers, body).into_response())
}

/// Authenticate, then look up metadata, then open the content, in that order.
async fn open_upstream<S: ObjectStore>(
    store: &S,
    file_id: &str,
) -> Result<(FileMetadata, ByteStream)> {
    tracing::debug!(file_id, phase = ?TransferPhase::Authenticating, "Connecting to provider");
    let session = store.connect().await?;

    tracing::debug!(file_id, phase = ?TransferPhase::FetchingMetadata, "Fetching metadata");
    let metadata = session.metadata(file_id).await?;
    let content = session.open(file_id).await?;

    Ok((metadata, content))
}

//! Chunk-by-chunk relay of an upstream byte stream into a response body.
//!
//! The relay is pull-based: a chunk is requested from upstream only when the
//! response body is polled, which hyper does only when the client connection
//! can take more data. Nothing is buffered beyond the chunk in hand.
//! Dropping the relay drops the upstream stream, which closes its connection.
//!
//! When the object size is known the relay finishes as soon as that many
//! bytes have been handed over. hyper stops polling a body once its
//! `Content-Length` is satisfied, so end-of-stream is never observed there.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use bytes::Bytes;
use futures::Stream;
use nela_drive::{ByteStream, StoreError};

/// Per-request lifecycle of a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPhase {
    /// Request received, nothing done yet.
    Idle,
    /// Checking the request parameters.
    ValidatingInput,
    /// Obtaining provider credentials.
    Authenticating,
    /// Looking up object metadata and opening the content stream.
    FetchingMetadata,
    /// Relaying body bytes to the client.
    StreamingBody,
    /// Upstream finished and every byte was handed to the client.
    Completed,
    /// Upstream failed; the client sees an aborted transfer.
    Failed,
    /// The client went away before the transfer finished.
    Cancelled,
}

impl TransferPhase {
    /// Whether no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransferPhase::Completed | TransferPhase::Failed | TransferPhase::Cancelled
        )
    }
}

/// A response body stream wrapping the upstream content.
pub struct RelayStream {
    file_id: String,
    inner: ByteStream,
    expected: Option<u64>,
    phase: TransferPhase,
    bytes_sent: u64,
    started: Instant,
}

impl RelayStream {
    /// Start relaying `inner` for `file_id`, expecting `expected` bytes if known.
    pub fn new(file_id: impl Into<String>, inner: ByteStream, expected: Option<u64>) -> Self {
        Self {
            file_id: file_id.into(),
            inner,
            expected,
            phase: TransferPhase::StreamingBody,
            bytes_sent: 0,
            started: Instant::now(),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> TransferPhase {
        self.phase
    }

    /// Bytes handed to the response so far.
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    fn complete(&mut self) {
        self.phase = TransferPhase::Completed;
        tracing::info!(
            file_id = %self.file_id,
            bytes = self.bytes_sent,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Download completed"
        );
    }
}

impl Stream for RelayStream {
    type Item = Result<Bytes, StoreError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.phase.is_terminal() {
            return Poll::Ready(None);
        }

        match this.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.bytes_sent += chunk.len() as u64;
                if this.expected.is_some_and(|size| this.bytes_sent >= size) {
                    this.complete();
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(err))) => {
                this.phase = TransferPhase::Failed;
                tracing::error!(
                    file_id = %this.file_id,
                    bytes = this.bytes_sent,
                    error = %err,
                    "Upstream stream failed mid-transfer"
                );
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                this.complete();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for RelayStream {
    fn drop(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = TransferPhase::Cancelled;
            tracing::debug!(
                file_id = %self.file_id,
                bytes = self.bytes_sent,
                "Download cancelled by client; releasing upstream"
            );
        }
    }
}

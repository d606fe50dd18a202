//! Downloads served by `axum::serve` over a real socket.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::Poll;
use std::time::Duration;

use axum::Router;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream;
use nela_download::Catalog;
use nela_drive::{FileMetadata, StoreError};

use crate::common::{Script, ScriptedStore, app, endless, payload};

/// Collects formatted log output.
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn test_known_size_download_completes_over_socket() {
    let logs = Arc::new(Mutex::new(Vec::new()));
    let writer_logs = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || LogBuffer(writer_logs.clone()))
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let end_polled = Arc::new(AtomicBool::new(false));
    let factory_flag = end_polled.clone();
    let store = ScriptedStore::new(Script {
        metadata: Some(FileMetadata::new("tiny.bin", "application/octet-stream", 10)),
        content: Some(Arc::new(move || {
            let flag = factory_flag.clone();
            stream::iter(vec![Ok::<_, StoreError>(Bytes::from(payload(10)))])
                .chain(stream::poll_fn(move |_| {
                    flag.store(true, Ordering::SeqCst);
                    Poll::Ready(None)
                }))
                .boxed()
        })),
    });
    let addr = serve(app(store, Catalog::empty())).await;

    let response = reqwest::get(format!("http://{addr}/api/download?fileId=tiny"))
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.bytes().await.unwrap(), payload(10));

    let logs = String::from_utf8(logs.lock().unwrap().clone()).unwrap();
    assert!(logs.contains("Download completed"), "{logs}");
    assert!(!logs.contains("Download cancelled"), "{logs}");
    assert!(!end_polled.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_client_disconnect_releases_upstream_over_socket() {
    let released = Arc::new(AtomicBool::new(false));
    let factory_released = released.clone();
    let store = ScriptedStore::new(Script {
        metadata: Some(FileMetadata::default()),
        content: Some(Arc::new(move || {
            endless(Bytes::from_static(&[7; 1024]), factory_released.clone())
        })),
    });
    let addr = serve(app(store, Catalog::empty())).await;

    let mut response = reqwest::get(format!("http://{addr}/api/download?fileId=endless"))
        .await
        .unwrap();
    assert!(response.chunk().await.unwrap().is_some());
    assert!(!released.load(Ordering::SeqCst));
    drop(response);

    tokio::time::timeout(Duration::from_secs(5), async {
        while !released.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

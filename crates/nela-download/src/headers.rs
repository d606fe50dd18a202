//! Response headers for proxied downloads.

use axum::http::header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue};
use nela_drive::FileMetadata;

/// Filename used when the provider reports none.
pub const DEFAULT_FILENAME: &str = "download";

/// MIME type used when the provider reports none.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Edge caches may keep a download for an hour; browsers must revalidate.
pub const DOWNLOAD_CACHE_CONTROL: &str = "public, max-age=0, s-maxage=3600";

/// Build the full header set for a download response.
pub fn download_headers(metadata: &FileMetadata) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let name = metadata.name.as_deref().unwrap_or(DEFAULT_FILENAME);
    headers.insert(CONTENT_DISPOSITION, content_disposition(name));

    let mime = metadata
        .mime_type
        .as_deref()
        .and_then(|m| HeaderValue::from_str(m).ok())
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_MIME_TYPE));
    headers.insert(CONTENT_TYPE, mime);

    if let Some(size) = metadata.size {
        headers.insert(CONTENT_LENGTH, HeaderValue::from(size));
    }

    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static(DOWNLOAD_CACHE_CONTROL),
    );
    headers
}

/// `attachment; filename="<name>"`, with an RFC 5987 `filename*` parameter
/// when the name is not plain printable ASCII.
pub fn content_disposition(name: &str) -> HeaderValue {
    let mut quoted = String::with_capacity(name.len());
    let mut plain = true;
    for c in name.chars() {
        match c {
            '"' | '\\' => {
                quoted.push('\\');
                quoted.push(c);
            }
            ' '..='~' => quoted.push(c),
            _ => {
                plain = false;
                quoted.push('_');
            }
        }
    }

    let value = if plain {
        format!("attachment; filename=\"{quoted}\"")
    } else {
        format!(
            "attachment; filename=\"{quoted}\"; filename*=UTF-8''{}",
            urlencoding::encode(name)
        )
    };

    HeaderValue::from_str(&value).unwrap_or_else(|_| {
        HeaderValue::from_static("attachment; filename=\"download\"")
    })
}

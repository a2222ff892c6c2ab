//! Direct streaming with HTTP range requests.
//!
//! Serves extracted media files straight from disk. Bodies are streamed in
//! 64KB chunks through `ReaderStream`, so memory stays bounded regardless of
//! file size.

use std::io::SeekFrom;
use std::path::Path;

use axum::{
    body::Body,
    extract::{Path as UrlPath, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use rarstream_common::paths::content_type_for;
use rarstream_common::StreamReference;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use super::range::{parse_range_header, ByteRange};
use crate::server::AppContext;

const CHUNK_SIZE: usize = 64 * 1024;

/// GET /stream/:folder/:filename
pub async fn stream_file(
    State(ctx): State<AppContext>,
    UrlPath((folder, filename)): UrlPath<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let reference = StreamReference::new(folder, filename);
    let file_path = match reference.resolve(ctx.pipeline.extract_dir()) {
        Ok(path) => path,
        Err(e) => {
            tracing::debug!("Rejected stream request: {e}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let range_header = headers.get(header::RANGE).and_then(|h| h.to_str().ok());

    serve_file(&file_path, range_header).await
}

/// Serve `file_path`, honouring an optional `Range` header value.
///
/// - missing file: 404 with an empty body
/// - no (or unparseable) range: 200 with the whole file
/// - satisfiable range: 206 with exactly the requested bytes
/// - unsatisfiable range: 416 with `Content-Range: bytes */<size>`
///
/// Once headers are sent a mid-stream read failure (for example the
/// directory being swept) just ends the body early.
pub async fn serve_file(file_path: &Path, range_header: Option<&str>) -> Response {
    let metadata = match tokio::fs::metadata(file_path).await {
        Ok(m) if m.is_file() => m,
        _ => return StatusCode::NOT_FOUND.into_response(),
    };

    let file_size = metadata.len();
    let content_type = content_type_for(file_path);
    let range = range_header.and_then(|value| parse_range_header(value, file_size));

    let mut file = match File::open(file_path).await {
        Ok(f) => f,
        Err(e) => {
            tracing::debug!(path = %file_path.display(), "File vanished before open: {e}");
            return StatusCode::NOT_FOUND.into_response();
        }
    };

    match range {
        Some(range @ ByteRange::Satisfiable { start, end }) => {
            let length = range.len();

            if let Err(e) = file.seek(SeekFrom::Start(start)).await {
                tracing::warn!(path = %file_path.display(), "Seek failed: {e}");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }

            let stream = ReaderStream::with_capacity(file.take(length), CHUNK_SIZE);

            tracing::debug!(path = %file_path.display(), start, end, file_size, "Serving range");

            (
                StatusCode::PARTIAL_CONTENT,
                [
                    (header::CONTENT_RANGE, format!("bytes {start}-{end}/{file_size}")),
                    (header::ACCEPT_RANGES, "bytes".to_string()),
                    (header::CONTENT_LENGTH, length.to_string()),
                    (header::CONTENT_TYPE, content_type),
                ],
                Body::from_stream(stream),
            )
                .into_response()
        }
        Some(ByteRange::Unsatisfiable) => (
            StatusCode::RANGE_NOT_SATISFIABLE,
            [
                (header::CONTENT_RANGE, format!("bytes */{file_size}")),
                (header::ACCEPT_RANGES, "bytes".to_string()),
            ],
            Body::empty(),
        )
            .into_response(),
        None => {
            let stream = ReaderStream::with_capacity(file, CHUNK_SIZE);

            (
                StatusCode::OK,
                [
                    (header::CONTENT_LENGTH, file_size.to_string()),
                    (header::CONTENT_TYPE, content_type),
                    (header::ACCEPT_RANGES, "bytes".to_string()),
                ],
                Body::from_stream(stream),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_bytes(response: Response) -> Vec<u8> {
        response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec()
    }

    fn header_str<'a>(response: &'a Response, name: header::HeaderName) -> &'a str {
        response.headers().get(name).unwrap().to_str().unwrap()
    }

    fn sample_file(len: usize) -> (tempfile::TempDir, std::path::PathBuf, Vec<u8>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("episode1.mp4");
        let data: Vec<u8> = (0..=255u8).cycle().take(len).collect();
        std::fs::write(&path, &data).unwrap();
        (dir, path, data)
    }

    #[tokio::test]
    async fn test_full_file() {
        let (_dir, path, data) = sample_file(1000);
        let response = serve_file(&path, None).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header_str(&response, header::CONTENT_LENGTH), "1000");
        assert_eq!(header_str(&response, header::CONTENT_TYPE), "video/mp4");
        assert_eq!(body_bytes(response).await, data);
    }

    #[tokio::test]
    async fn test_range_request() {
        let (_dir, path, data) = sample_file(1000);
        let response = serve_file(&path, Some("bytes=0-99")).await;

        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(header_str(&response, header::CONTENT_RANGE), "bytes 0-99/1000");
        assert_eq!(header_str(&response, header::CONTENT_LENGTH), "100");
        assert_eq!(header_str(&response, header::ACCEPT_RANGES), "bytes");
        assert_eq!(body_bytes(response).await, &data[..100]);
    }

    #[tokio::test]
    async fn test_open_ended_range() {
        let (_dir, path, data) = sample_file(500);
        let response = serve_file(&path, Some("bytes=400-")).await;

        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(header_str(&response, header::CONTENT_RANGE), "bytes 400-499/500");
        assert_eq!(body_bytes(response).await, &data[400..]);
    }

    #[tokio::test]
    async fn test_unsatisfiable_range() {
        let (_dir, path, _data) = sample_file(500);
        let response = serve_file(&path, Some("bytes=900-950")).await;

        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(header_str(&response, header::CONTENT_RANGE), "bytes */500");
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_range_serves_full_file() {
        let (_dir, path, data) = sample_file(300);
        let response = serve_file(&path, Some("bytes=abc")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, data);
    }

    #[tokio::test]
    async fn test_missing_file_is_404_with_empty_body() {
        let dir = tempfile::tempdir().unwrap();
        let response = serve_file(&dir.path().join("nope.mp4"), None).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_directory_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let response = serve_file(dir.path(), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_extension_is_octet_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.zzz");
        std::fs::write(&path, b"abc").unwrap();

        let response = serve_file(&path, None).await;
        assert_eq!(
            header_str(&response, header::CONTENT_TYPE),
            "application/octet-stream"
        );
    }
}

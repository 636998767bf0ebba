//! Streams a [`Resource`] as a full or partial HTTP response.

use std::io::{self, SeekFrom};

use axum::body::Body;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::Response;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::error::{ApiError, ApiResult};
use crate::resource::Resource;
use crate::resource::range::{RangeError, parse_range};

// default capacity 64KiB
const CHUNK_CAPACITY: usize = 65536;

/// Build the response for `resource`, honouring an optional `Range` header.
///
/// Without a range the whole resource is sent with 200; with a satisfiable
/// range exactly `[start, end]` is sent with 206.
pub async fn serve_resource(resource: Resource, range: Option<&str>) -> ApiResult<Response> {
    let Resource {
        name,
        size,
        mut reader,
    } = resource;

    let range = range
        .map(|h| {
            parse_range(h, size).map_err(|e| match e {
                RangeError::Malformed(h) => ApiError::BadRange(h),
                RangeError::Unsatisfiable => ApiError::RangeNotSatisfiable { size },
            })
        })
        .transpose()?;

    let (status, start, len) = match range {
        Some(r) => (StatusCode::PARTIAL_CONTENT, r.start, r.byte_len()),
        None => (StatusCode::OK, 0, size),
    };

    if start > 0 {
        reader.seek(SeekFrom::Start(start)).await?;
    }

    let content_type = mime_guess::from_path(&name).first_or_octet_stream();
    let mut builder = Response::builder()
        .status(status)
        .header(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"))
        .header(header::CONTENT_LENGTH, len)
        .header(header::CONTENT_TYPE, content_type.as_ref());

    if let Some(r) = range {
        builder = builder.header(header::CONTENT_RANGE, r.content_range(size));
    }

    let stream = ReaderStream::with_capacity(reader.take(len), CHUNK_CAPACITY);
    builder
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::Io(io::Error::other(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Resource {
        let bytes: Vec<u8> = (0..=255u8).cycle().take(500).collect();
        Resource::from_bytes("sample.bin", bytes)
    }

    async fn body(resp: Response) -> Vec<u8> {
        axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn full_body_without_range() {
        let resp = serve_resource(sample(), None).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_LENGTH], "500");
        assert_eq!(resp.headers()[header::ACCEPT_RANGES], "bytes");
        assert!(resp.headers().get(header::CONTENT_RANGE).is_none());
        assert_eq!(body(resp).await.len(), 500);
    }

    #[tokio::test]
    async fn partial_body_is_exact_slice() {
        let resp = serve_resource(sample(), Some("bytes=250-259")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(resp.headers()[header::CONTENT_RANGE], "bytes 250-259/500");
        assert_eq!(resp.headers()[header::CONTENT_LENGTH], "10");
        let expected: Vec<u8> = (250..260).map(|i| (i % 256) as u8).collect();
        assert_eq!(body(resp).await, expected);
    }

    #[tokio::test]
    async fn content_type_from_name() {
        let resp = serve_resource(Resource::from_bytes("page.html", "<p/>"), None)
            .await
            .unwrap();
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/html");

        let resp = serve_resource(Resource::from_bytes("blob", "x"), None).await.unwrap();
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE],
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn range_errors_map_to_api_errors() {
        let err = serve_resource(sample(), Some("bytes=600-700")).await.unwrap_err();
        assert!(matches!(err, ApiError::RangeNotSatisfiable { size: 500 }));

        let err = serve_resource(sample(), Some("lines=1-2")).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRange(_)));
    }
}

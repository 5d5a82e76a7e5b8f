//! Inbound request capture.
//!
//! # Responsibilities
//! - Buffer the inbound request into a forwardable value
//! - Filter headers the gateway must own for the outbound hop
//! - Buffer a multipart file upload for re-encoding
//!
//! # Design Decisions
//! - One `ProxiedRequest` per inbound request; it never outlives it
//! - Bodies are buffered up front so a failover retry can resend them
//! - Tenant and auth headers pass through untouched

use axum::body::{to_bytes, Body, Bytes};
use axum::extract::{FromRequest, Multipart};
use axum::http::{header, HeaderMap, Method, Request};
use thiserror::Error;

/// RFC 7230 hop-by-hop headers, never forwarded.
const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Headers the outbound client must set itself for its own hop.
const GATEWAY_OWNED_HEADERS: [&str; 4] = ["host", "content-length", "accept-encoding", "expect"];

/// Why an inbound request could not be captured.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to read request body: {0}")]
    Body(String),

    #[error("invalid multipart upload: {0}")]
    Multipart(String),

    #[error("multipart upload carried no file part")]
    NoFilePart,
}

/// A single buffered file part from a multipart upload.
#[derive(Debug, Clone)]
pub struct BufferedFile {
    pub field_name: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Body classification for an inbound request.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Buffered(Bytes),
    File(BufferedFile),
}

/// Everything the forwarder needs from an inbound request.
///
/// Headers are already filtered; the body is fully buffered so the same
/// request can be sent to a fallback after a failed primary attempt.
#[derive(Debug, Clone)]
pub struct ProxiedRequest {
    pub method: Method,
    pub headers: HeaderMap,
    pub query: Option<String>,
    pub body: RequestBody,
}

impl ProxiedRequest {
    /// Capture an inbound request, buffering its body.
    ///
    /// `max_body_bytes` bounds how much body is read into memory.
    pub async fn capture(
        request: Request<Body>,
        max_body_bytes: usize,
    ) -> Result<Self, CaptureError> {
        let method = request.method().clone();
        let query = request.uri().query().map(ToString::to_string);
        let mut headers = filter_headers(request.headers());

        let body = if !carries_body(&method) {
            RequestBody::Empty
        } else if is_multipart(request.headers()) {
            // reqwest re-encodes the form with its own boundary.
            headers.remove(header::CONTENT_TYPE);
            RequestBody::File(capture_file(request).await?)
        } else {
            let bytes = to_bytes(request.into_body(), max_body_bytes)
                .await
                .map_err(|e| CaptureError::Body(e.to_string()))?;
            RequestBody::Buffered(bytes)
        };

        Ok(Self {
            method,
            headers,
            query,
            body,
        })
    }
}

/// Copy headers, dropping the hop-by-hop set and gateway-owned entries.
pub fn filter_headers(headers: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name_str = name.as_str();
        if HOP_BY_HOP_HEADERS.contains(&name_str) || GATEWAY_OWNED_HEADERS.contains(&name_str) {
            continue;
        }
        filtered.append(name.clone(), value.clone());
    }
    filtered
}

fn carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"))
}

/// Buffer the first file part of a multipart upload.
async fn capture_file(request: Request<Body>) -> Result<BufferedFile, CaptureError> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| CaptureError::Multipart(e.to_string()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| CaptureError::Multipart(e.to_string()))?
    {
        let Some(file_name) = field.file_name() else {
            continue;
        };

        let file_name = file_name.to_string();
        let field_name = field.name().unwrap_or("file").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| CaptureError::Multipart(e.to_string()))?;

        return Ok(BufferedFile {
            field_name,
            file_name,
            content_type,
            bytes,
        });
    }

    Err(CaptureError::NoFilePart)
}

//! Outbound request forwarding.
//!
//! # Responsibilities
//! - Build the outbound request: base URL + unmodified path + verbatim query
//! - Relay buffered bodies, re-encode file uploads, pipe streaming downloads
//! - Classify upstream replies for the failover layer
//!
//! # Design Decisions
//! - [200, 300) and 304 count as success; 304 always relays an empty body
//! - Structured failure statuses are values, not errors; only the absence
//!   of a usable response is a `ForwardError`
//! - Streaming replies are piped with backpressure, never buffered
//! - Streamed sends are bounded until headers arrive, then run freely
//! - Redirects relay as-is; the client follows them, not the gateway

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tokio::time;

use crate::config::schema::TimeoutConfig;
use crate::observability::metrics;
use crate::proxy::request::{BufferedFile, ProxiedRequest, RequestBody};

/// Per-call forwarding options.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardOptions {
    /// Force streaming relay regardless of path and query hints.
    pub stream: bool,
}

/// Why no usable response was obtained from an upstream.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("failed to encode outbound request: {0}")]
    Encode(#[source] reqwest::Error),

    #[error("error communicating with service: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("no response from service within {0:?}")]
    Timeout(Duration),
}

/// An upstream reply, already converted for relay to the caller.
///
/// `Failure` still carries the exact status and body the upstream produced;
/// the distinction only tells a wrapping failover layer whether to move on.
#[derive(Debug)]
pub enum UpstreamReply {
    Success(Response),
    Failure(Response),
}

impl UpstreamReply {
    /// Unwrap the relayable response regardless of classification.
    pub fn into_response(self) -> Response {
        match self {
            UpstreamReply::Success(response) | UpstreamReply::Failure(response) => response,
        }
    }
}

/// Forwards one inbound request to one upstream target.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    upstream_timeout: Duration,
}

impl Forwarder {
    /// Build the forwarder and its shared outbound client.
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()?;

        Ok(Self {
            client,
            upstream_timeout: Duration::from_secs(timeouts.upstream_secs),
        })
    }

    /// Send the request to one upstream and classify the outcome.
    ///
    /// Exactly one outbound attempt is made per call.
    pub async fn dispatch(
        &self,
        base_url: &str,
        path: &str,
        request: &ProxiedRequest,
        options: ForwardOptions,
    ) -> Result<UpstreamReply, ForwardError> {
        let mut url = format!("{base_url}{path}");
        if let Some(query) = &request.query {
            url.push('?');
            url.push_str(query);
        }
        let streaming = options.stream || wants_stream(path, request.query.as_deref());

        tracing::info!(
            method = %request.method,
            url = %url,
            streaming,
            "forwarding to upstream"
        );
        let start_time = Instant::now();

        let mut outbound = self
            .client
            .request(request.method.clone(), &url)
            .headers(request.headers.clone());
        if !streaming {
            outbound = outbound.timeout(self.upstream_timeout);
        }
        outbound = match &request.body {
            RequestBody::Empty => outbound,
            RequestBody::Buffered(bytes) => outbound.body(bytes.clone()),
            RequestBody::File(file) => outbound.multipart(file_form(file)?),
        };

        // Buffered calls are bounded end to end. Streamed calls are bounded
        // only until headers arrive: the body runs as long as the client
        // keeps reading, but an upstream that stalls before responding still
        // counts as unreachable.
        let sent = if streaming {
            match time::timeout(self.upstream_timeout, outbound.send()).await {
                Ok(outcome) => outcome.map_err(ForwardError::Unreachable),
                Err(_) => Err(ForwardError::Timeout(self.upstream_timeout)),
            }
        } else {
            outbound.send().await.map_err(ForwardError::Unreachable)
        };

        let upstream = match sent {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    method = %request.method,
                    url = %url,
                    error = %e,
                    "upstream unreachable"
                );
                metrics::record_unreachable(base_url);
                return Err(e);
            }
        };

        let status = upstream.status();
        tracing::info!(
            method = %request.method,
            url = %url,
            status = status.as_u16(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "upstream responded"
        );
        metrics::record_forward(request.method.as_str(), status.as_u16(), base_url, start_time);

        let response = into_relay(upstream, streaming).await?;
        if is_success(status) {
            Ok(UpstreamReply::Success(response))
        } else {
            Ok(UpstreamReply::Failure(response))
        }
    }

    /// Forward standalone: relay whatever the upstream answered, or the
    /// gateway's own 500 envelope when no response was obtained.
    pub async fn forward(
        &self,
        base_url: &str,
        path: &str,
        request: &ProxiedRequest,
        options: ForwardOptions,
    ) -> Response {
        match self.dispatch(base_url, path, request, options).await {
            Ok(reply) => reply.into_response(),
            Err(e) => service_error(&e),
        }
    }
}

/// Success for relay purposes: 2xx, or 304 from a conditional request.
fn is_success(status: StatusCode) -> bool {
    status.is_success() || status == StatusCode::NOT_MODIFIED
}

/// Streaming relay is requested via query flag or a download path segment.
fn wants_stream(path: &str, query: Option<&str>) -> bool {
    if path.contains("/download") {
        return true;
    }
    query.is_some_and(|q| q.split('&').any(|pair| pair == "download=true"))
}

/// Convert an upstream reply into the response relayed to the caller.
async fn into_relay(upstream: reqwest::Response, streaming: bool) -> Result<Response, ForwardError> {
    let status = upstream.status();

    if status == StatusCode::NOT_MODIFIED {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = status;
        return Ok(response);
    }

    if streaming && is_success(status) {
        let mut relay_headers = HeaderMap::new();
        copy_header(upstream.headers(), &mut relay_headers, header::CONTENT_TYPE);
        copy_header(
            upstream.headers(),
            &mut relay_headers,
            header::CONTENT_DISPOSITION,
        );

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = relay_headers;
        return Ok(response);
    }

    let content_type = upstream.headers().get(header::CONTENT_TYPE).cloned();
    let bytes = upstream.bytes().await.map_err(ForwardError::Unreachable)?;

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    if let Some(content_type) = content_type {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, content_type);
    }
    Ok(response)
}

fn copy_header(from: &HeaderMap, to: &mut HeaderMap, name: header::HeaderName) {
    if let Some(value) = from.get(&name) {
        to.insert(name, value.clone());
    }
}

fn file_form(file: &BufferedFile) -> Result<reqwest::multipart::Form, ForwardError> {
    let part = reqwest::multipart::Part::bytes(file.bytes.to_vec())
        .file_name(file.file_name.clone())
        .mime_str(&file.content_type)
        .map_err(ForwardError::Encode)?;

    Ok(reqwest::multipart::Form::new().part(file.field_name.clone(), part))
}

/// The gateway's own reply when an upstream produced no response.
fn service_error(error: &ForwardError) -> Response {
    tracing::error!(error = %error, "forwarding failed with no upstream response");
    let body = Json(json!({
        "error": "Error communicating with service",
        "details": error.to_string(),
    }));
    (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
}

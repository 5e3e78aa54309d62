//! Streaming upstream responses back to the caller.
//!
//! # Responsibilities
//! - Copy upstream status and Content-Type verbatim
//! - Stream the body chunk by chunk, never buffering it whole
//! - Log body errors that occur after the status line was sent
//!
//! # Design Decisions
//! - Only Content-Type is echoed; other upstream headers stay behind
//! - The body stream is owned by the response; if the caller disconnects,
//!   hyper drops it and the upstream connection is released with it
//! - A mid-stream failure truncates the body; status cannot be rewritten

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::response::Response;
use futures_util::TryStreamExt;

use crate::observability::metrics;
use crate::proxy::{Proxied, ProxyError};

/// Turn an upstream response into the caller's response.
pub fn stream_response(proxied: Proxied, request_id: &str) -> Response {
    let Proxied { source, upstream } = proxied;
    let status = upstream.status();
    let content_type = upstream.headers().get(CONTENT_TYPE).cloned();

    let request_id = request_id.to_string();
    let body = upstream.bytes_stream().map_err(move |e| {
        tracing::warn!(
            request_id = %request_id,
            source = source.as_str(),
            error = %e,
            "Response body copy failed, stream truncated"
        );
        metrics::record_stream_error(source.as_str());
        ProxyError::StreamCopyFailure(e)
    });

    let mut response = Response::new(Body::from_stream(body));
    *response.status_mut() = status;
    if let Some(content_type) = content_type {
        response.headers_mut().insert(CONTENT_TYPE, content_type);
    }
    response
}

//! Error taxonomy of the proxy pipeline.

use std::error::Error as _;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Everything that can go wrong while serving one proxied image.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// `url` query parameter absent or empty.
    #[error("Missing 'url' query parameter")]
    MissingParameter,

    /// `url` is not an absolute http(s) URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Transport failure talking to the target (refused, DNS, timeout).
    #[error("Error fetching upstream: {0}")]
    UpstreamUnreachable(#[source] reqwest::Error),

    /// Target answered with something that is not an image.
    #[error("Forbidden: upstream returned non-image content type '{0}'")]
    NonImageContent(String),

    /// Transport failure talking to the image gateway.
    #[error("Error fetching from gateway: {0}")]
    FallbackUnreachable(#[source] reqwest::Error),

    /// Body copy broke after the status line went out. Only ever logged.
    #[error("Error copying response body: {0}")]
    StreamCopyFailure(#[source] reqwest::Error),

    /// The shared client pool could not be constructed.
    #[error("Error creating upstream client: {0}")]
    ClientInit(#[source] reqwest::Error),
}

impl ProxyError {
    /// HTTP status reported to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingParameter | ProxyError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            ProxyError::NonImageContent(_) => StatusCode::FORBIDDEN,
            ProxyError::UpstreamUnreachable(_) | ProxyError::FallbackUnreachable(_) => {
                StatusCode::BAD_GATEWAY
            }
            ProxyError::StreamCopyFailure(_) | ProxyError::ClientInit(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Label used when this error sends a request to the gateway.
    pub fn fallback_reason(&self) -> &'static str {
        match self {
            ProxyError::UpstreamUnreachable(_) => "unreachable",
            ProxyError::NonImageContent(_) => "non_image",
            _ => "other",
        }
    }

    /// Display text followed by every underlying cause.
    pub fn detail(&self) -> String {
        let mut message = self.to_string();
        let mut source = self.source().and_then(|s| s.source());
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), self.detail()).into_response()
    }
}

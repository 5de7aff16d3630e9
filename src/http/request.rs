//! Inbound request capture.
//!
//! # Responsibilities
//! - Capture method, raw target, headers of a proxied request
//! - Read exactly the declared body, if any
//!
//! # Design Decisions
//! - Only `Content-Length` bodies are forwarded; chunked request bodies are not supported
//! - Body size is checked against the limit before anything is read

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Method, Request};

use crate::http::relay::RelayError;

/// One client request bound for the backend.
#[derive(Debug, Clone)]
pub struct ProxiedRequest {
    pub method: Method,
    /// Raw path and query as sent by the client.
    pub target: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl ProxiedRequest {
    /// Capture a request, reading its body when a positive `Content-Length` was declared.
    pub async fn from_request(request: Request<Body>, max_body_size: usize) -> Result<Self, RelayError> {
        let (parts, body) = request.into_parts();
        let target = request_target(parts.uri.path_and_query().map(|pq| pq.as_str()), parts.uri.path());

        let body = match declared_length(&parts.headers) {
            Some(len) if len > max_body_size as u64 => {
                return Err(RelayError::BodyTooLarge(len));
            }
            Some(len) if len > 0 => {
                let bytes = axum::body::to_bytes(body, max_body_size)
                    .await
                    .map_err(|e| RelayError::Body(e.to_string()))?;
                Some(bytes)
            }
            _ => None,
        };

        Ok(Self {
            method: parts.method,
            target,
            headers: parts.headers,
            body,
        })
    }
}

/// Raw `path?query`, falling back to the bare path.
pub fn request_target(path_and_query: Option<&str>, path: &str) -> String {
    path_and_query.unwrap_or(path).to_string()
}

/// The client's `Content-Length`, if present and numeric.
pub fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

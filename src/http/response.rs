//! Client response construction.
//!
//! # Responsibilities
//! - Turn a fully read backend response into the client response
//! - Apply inbound header translation and `Expires` fabrication
//! - Set an exact `Content-Length` for the buffered body
//!
//! # Design Decisions
//! - Backend bodies are buffered, so chunked responses are re-sent with a length
//! - `Date` is added by the server; `Server` names this proxy

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::Response;
use chrono::{DateTime, Utc};

use crate::security::headers;

/// Value of the `Server` header on locally generated responses.
pub const SERVER_NAME: &str = concat!("bz-session-proxy/", env!("CARGO_PKG_VERSION"));

/// Format a timestamp as an HTTP date (`Sun, 06 Nov 1994 08:49:37 GMT`).
pub fn http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Build the client response for a backend response.
///
/// `method` and `client_target` are those of the original client request,
/// not of the last redirect hop.
pub fn relay_response(
    status: StatusCode,
    backend_headers: &HeaderMap,
    body: Bytes,
    method: &Method,
    client_target: &str,
    anonymous: bool,
) -> Response {
    let mut headers = headers::inbound(backend_headers);

    if let Some(max_age) = headers::fabricated_expiry(method, client_target, backend_headers, anonymous) {
        let expires = Utc::now() + chrono::Duration::seconds(max_age.as_secs() as i64);
        if let Ok(value) = HeaderValue::from_str(&http_date(expires)) {
            headers.insert(header::EXPIRES, value);
        }
    }

    headers.insert(header::SERVER, HeaderValue::from_static(SERVER_NAME));
    // a HEAD reply has no body; report the length the backend announced
    let length = match backend_headers.get(header::CONTENT_LENGTH) {
        Some(value) if *method == Method::HEAD => value.clone(),
        _ => HeaderValue::from(body.len()),
    };
    headers.insert(header::CONTENT_LENGTH, length);

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

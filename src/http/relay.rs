//! Request relay to the backend.
//!
//! # Responsibilities
//! - Issue the client's request against the backend URL for its path
//! - Chase 302/303 redirects with GETs
//! - Read the complete final response before anything reaches the client
//!
//! # Design Decisions
//! - The request target goes out byte-for-byte; no URL normalization
//! - A fresh backend connection per exchange; it is released whenever the
//!   response is dropped, including on every error path
//! - No retries: a transport failure fails this one client request

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use http_body_util::{BodyExt, Full};
use thiserror::Error;
use url::Url;

use crate::http::redirect::RedirectChain;
use crate::http::request::ProxiedRequest;
use crate::http::response::relay_response;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::headers;

/// Per-request relay failures. Each one is answered to the affected client only.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("circular redirection, or too many redirects (after {hops} redirects)")]
    RedirectLoop { hops: usize },

    #[error("backend unreachable: {0}")]
    Unreachable(#[from] hyper_util::client::legacy::Error),

    #[error("backend response broken off: {0}")]
    BackendBody(#[source] hyper::Error),

    #[error("backend did not answer within {0:?}")]
    Timeout(Duration),

    #[error("invalid redirect location {0}")]
    InvalidLocation(String),

    #[error("invalid backend URL: {0}")]
    BadTarget(String),

    #[error("request body of {0} bytes is too large")]
    BodyTooLarge(u64),

    #[error("failed to read request body: {0}")]
    Body(String),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::RedirectLoop { .. } => StatusCode::BAD_REQUEST,
            RelayError::Unreachable(_) | RelayError::BackendBody(_) | RelayError::InvalidLocation(_) => {
                StatusCode::BAD_GATEWAY
            }
            RelayError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            RelayError::BadTarget(_) | RelayError::Body(_) => StatusCode::BAD_REQUEST,
            RelayError::BodyTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            RelayError::RedirectLoop { .. } => "Circular redirection, or too many redirects",
            RelayError::Unreachable(_) => "Backend unreachable",
            RelayError::BackendBody(_) => "Backend response incomplete",
            RelayError::InvalidLocation(_) => "Backend sent an invalid redirect",
            RelayError::Timeout(_) => "Backend timed out",
            RelayError::BadTarget(_) => "Bad request target",
            RelayError::BodyTooLarge(_) => "Request body too large",
            RelayError::Body(_) => "Invalid request body",
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Relay failed");
        } else {
            tracing::warn!(error = %self, "Relay rejected");
        }
        (status, self.reason()).into_response()
    }
}

/// Relay one request to the backend and build the client response.
pub async fn relay(state: &AppState, request: ProxiedRequest) -> Result<Response, RelayError> {
    // the request target is passed on as received; `Url` only serves redirect bookkeeping
    let start = state.target.url_for(&request.target);
    let start_uri = start.parse::<Uri>().map_err(|e| RelayError::BadTarget(e.to_string()))?;
    let start_url = Url::parse(&start).map_err(|e| RelayError::BadTarget(e.to_string()))?;
    let session = state.session.as_deref();

    tracing::info!(url = %start, method = %request.method, "Proxying to {}", start);

    let outbound = headers::outbound(&request.headers, session);
    let body = request.body.clone().unwrap_or_default();
    let (mut status, mut backend_headers, mut body) =
        exchange(state, backend_request(request.method.clone(), start_uri, outbound, body)).await?;

    let mut chain = RedirectChain::new(start_url);
    loop {
        let Some(next) = chain.next_hop(status, &backend_headers)? else {
            break;
        };
        tracing::info!(url = %next, hops = chain.hops(), "Redirecting to {}", next);
        metrics::record_redirect();

        let uri: Uri = next
            .as_str()
            .parse()
            .map_err(|_| RelayError::InvalidLocation(next.to_string()))?;

        // the original body is not replayed against the GET
        let outbound = headers::outbound(&request.headers, session);
        (status, backend_headers, body) =
            exchange(state, backend_request(Method::GET, uri, outbound, Bytes::new())).await?;
    }

    tracing::debug!(status = %status, bytes = body.len(), hops = chain.hops(), "Backend response read");

    Ok(relay_response(
        status,
        &backend_headers,
        body,
        &request.method,
        &request.target,
        state.is_anonymous(),
    ))
}

fn backend_request(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Request<Full<Bytes>> {
    let mut request = Request::new(Full::new(body));
    *request.method_mut() = method;
    *request.uri_mut() = uri;
    *request.headers_mut() = headers;
    request
}

/// Send one request and read the complete response within the exchange deadline.
async fn exchange(
    state: &AppState,
    request: Request<Full<Bytes>>,
) -> Result<(StatusCode, HeaderMap, Bytes), RelayError> {
    let deadline = state.backend_timeout;
    let read = async {
        let response = state.backend.request(request).await?;
        let (parts, body) = response.into_parts();
        let bytes = body.collect().await.map_err(RelayError::BackendBody)?.to_bytes();
        Ok::<_, RelayError>((parts.status, parts.headers, bytes))
    };

    match tokio::time::timeout(deadline, read).await {
        Ok(result) => result,
        Err(_) => Err(RelayError::Timeout(deadline)),
    }
}

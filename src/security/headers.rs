//! Header and cookie translation between client and backend.
//!
//! # Responsibilities
//! - Client → backend: drop client cookies, Host and forwarded-host headers,
//!   inject the bootstrapped session cookie
//! - Backend → client: drop the backend session (`Set-Cookie`) and headers
//!   regenerated locally (`Date`, `Server`, framing)
//! - Decide on a fabricated `Expires` for cacheable GETs
//!
//! # Design Decisions
//! - The backend never sees client cookies; the client never sees backend cookies
//! - Never trust X-Forwarded-Host / X-Forwarded-Server from clients
//! - Hop-by-hop headers are stripped in both directions
//! - Framing (`Content-Length`, `Transfer-Encoding`) is always recomputed

use std::time::Duration;

use axum::http::{header, HeaderMap, HeaderName, Method};

use crate::session::SessionCookie;

/// Hop-by-hop headers, meaningful for one connection only.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Client headers never forwarded to the backend.
const CLIENT_DENYLIST: &[&str] = &[
    "cookie",
    "host",
    "x-forwarded-host",
    "x-forwarded-server",
    "content-length",
];

/// Backend headers never relayed to the client.
const BACKEND_DENYLIST: &[&str] = &[
    "date",
    "server",
    "set-cookie",
    "content-length",
];

/// Attachments never change once uploaded.
pub const ATTACHMENT_MAX_AGE: Duration = Duration::from_secs(31 * 24 * 60 * 60);

/// Staleness bound for content fetched without a login.
pub const ANONYMOUS_MAX_AGE: Duration = Duration::from_secs(5 * 60);

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// Headers for a backend request built from the client's headers.
///
/// `Content-Length` is left to the client library, which derives it from the
/// forwarded body; a redirected GET carries no body and so no length.
pub fn outbound(client: &HeaderMap, session: Option<&SessionCookie>) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(client.len() + 1);
    for (name, value) in client {
        if is_hop_by_hop(name) || CLIENT_DENYLIST.contains(&name.as_str()) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    if let Some(value) = session.and_then(SessionCookie::header_value) {
        headers.insert(header::COOKIE, value);
    }

    headers
}

/// Headers for the client built from a backend response.
pub fn inbound(backend: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(backend.len());
    for (name, value) in backend {
        if is_hop_by_hop(name) || BACKEND_DENYLIST.contains(&name.as_str()) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

/// How far in the future to set `Expires` on a relayed response, if at all.
///
/// Only GETs whose backend response had no `Expires` qualify. Attachments get a
/// month; anything else gets five minutes when the proxy has no session, and
/// nothing when it is logged in.
pub fn fabricated_expiry(
    method: &Method,
    client_path: &str,
    backend: &HeaderMap,
    anonymous: bool,
) -> Option<Duration> {
    if method != Method::GET || backend.contains_key(header::EXPIRES) {
        return None;
    }

    if client_path.starts_with("/attachment.cgi?") {
        Some(ATTACHMENT_MAX_AGE)
    } else if anonymous {
        Some(ANONYMOUS_MAX_AGE)
    } else {
        None
    }
}

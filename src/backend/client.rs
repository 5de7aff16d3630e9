//! Outbound HTTP clients.
//!
//! # Design Decisions
//! - Proxied requests go through a hyper client so the request target reaches
//!   the backend byte-for-byte; the login call uses reqwest
//! - Redirects are never followed by either client; the relay chases them itself
//! - No idle pooling: every backend exchange opens a fresh connection and the
//!   connection is closed when the response is dropped
//! - No cookie store and no environment proxies

use axum::body::Bytes;
use http_body_util::Full;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use crate::resilience::TimeoutPolicy;

/// Client carrying proxied requests to the backend over HTTP or HTTPS.
pub type RelayClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Build the client used for the login call.
pub fn build_client(policy: &TimeoutPolicy) -> Result<reqwest::Client, reqwest::Error> {
    policy
        .apply(reqwest::Client::builder())
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .user_agent(concat!("bz-session-proxy/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Build the client used for every proxied request.
///
/// Only the connect deadline lives here; the relay bounds each exchange.
pub fn build_relay_client(policy: &TimeoutPolicy) -> Result<RelayClient, rustls::Error> {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(policy.connect));

    let connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_provider_and_webpki_roots(rustls::crypto::ring::default_provider())?
        .https_or_http()
        .enable_http1()
        .wrap_connector(http);

    Ok(Client::builder(TokioExecutor::new())
        .pool_max_idle_per_host(0)
        .build(connector))
}

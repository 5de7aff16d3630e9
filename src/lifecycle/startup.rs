//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve the backend and read the `config.js` template
//! - Build the backend client and bootstrap the session
//! - Bind the listener
//!
//! # Design Decisions
//! - Fail fast: configuration errors are fatal, login errors are not
//! - The session is settled before the listener is bound, so every connection
//!   sees the same immutable state

use chrono::Utc;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::backend::{build_client, build_relay_client, BackendTarget};
use crate::config::{ConfigError, ProxyConfig, SiteConfig};
use crate::http::{AppState, ConfigJs};
use crate::resilience::TimeoutPolicy;
use crate::session;

/// Errors that stop the process before it serves.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot build backend client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("cannot set up TLS for the backend: {0}")]
    Tls(#[from] rustls::Error),

    #[error("cannot listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Build the shared state for one site: backend, session, `config.js`.
pub async fn prepare(config: &ProxyConfig, site: &SiteConfig) -> Result<AppState, StartupError> {
    let started = Utc::now();

    let target = BackendTarget::parse(&site.bugzilla_url)?;
    let template = ConfigJs::read_template(&config.server.web_root)?;

    let policy = TimeoutPolicy::from_config(&config.timeouts);
    let client = build_client(&policy)?;
    let relay_client = build_relay_client(&policy)?;

    let session = session::bootstrap(&client, &target, site).await;
    if session.is_none() {
        tracing::info!(url = %site.bugzilla_url, "Proxying to {} anonymously", site.bugzilla_url);
    }

    let config_js = ConfigJs::render(&template, &site.bugzilla_url, session.is_some(), started);

    Ok(AppState::new(
        target,
        session,
        config_js,
        relay_client,
        &policy,
        &config.server.web_root,
        config.server.max_body_size,
    ))
}

/// Bind the site's listening socket.
pub async fn bind(site: &SiteConfig) -> Result<TcpListener, StartupError> {
    let addr = format!("{}:{}", site.proxy_bind, site.proxy_port);
    let listener = TcpListener::bind((site.proxy_bind.as_str(), site.proxy_port))
        .await
        .map_err(|source| StartupError::Bind {
            addr: addr.clone(),
            source,
        })?;

    tracing::info!(address = %addr, "Running as http://{}/index.html", addr);
    Ok(listener)
}

//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum Router with the dispatch handler
//! - Wire up middleware (tracing, request ID, overall timeout)
//! - Classify each request and hand it to the relay, `config.js` or static files
//! - Serve until the shutdown signal
//!
//! Every accepted connection is served by its own task. The only state shared
//! between tasks is [`AppState`], which is built before the listener starts and
//! never changes afterwards.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceExt;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::backend::{BackendTarget, RelayClient};
use crate::http::config_js::ConfigJs;
use crate::http::relay::{self, RelayError};
use crate::http::request::{request_target, ProxiedRequest};
use crate::observability::metrics;
use crate::resilience::TimeoutPolicy;
use crate::routing::{self, ProxiedPaths, Route};
use crate::session::SessionCookie;

/// Application state injected into handlers. Read-only once serving starts.
#[derive(Clone)]
pub struct AppState {
    pub target: Arc<BackendTarget>,
    pub session: Option<Arc<SessionCookie>>,
    pub config_js: Arc<ConfigJs>,
    pub backend: RelayClient,
    /// Deadline for one backend exchange.
    pub backend_timeout: Duration,
    pub paths: Arc<ProxiedPaths>,
    pub static_files: ServeDir,
    pub max_body_size: usize,
}

impl AppState {
    pub fn new(
        target: BackendTarget,
        session: Option<SessionCookie>,
        config_js: ConfigJs,
        backend: RelayClient,
        timeouts: &TimeoutPolicy,
        web_root: &Path,
        max_body_size: usize,
    ) -> Self {
        Self {
            target: Arc::new(target),
            session: session.map(Arc::new),
            config_js: Arc::new(config_js),
            backend,
            backend_timeout: timeouts.backend,
            paths: Arc::new(ProxiedPaths::default()),
            static_files: ServeDir::new(web_root),
            max_body_size,
        }
    }

    /// True when requests go to the backend without a session.
    pub fn is_anonymous(&self) -> bool {
        self.session.is_none()
    }
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server around fully initialized state.
    pub fn new(state: AppState, timeouts: TimeoutPolicy) -> Self {
        Self {
            router: Self::build_router(state, timeouts),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState, timeouts: TimeoutPolicy) -> Router {
        Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(TimeoutLayer::with_status_code(StatusCode::GATEWAY_TIMEOUT, timeouts.request))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until shutdown.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Route a request to the relay, the `config.js` responder or the static files.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let target = request_target(
        request.uri().path_and_query().map(|pq| pq.as_str()),
        request.uri().path(),
    );
    let method = request.method().clone();

    match routing::classify(&state.paths, &method, &target) {
        Route::Proxied => {
            let start = Instant::now();
            let response = proxy(&state, request)
                .await
                .unwrap_or_else(IntoResponse::into_response);
            metrics::record_request(method.as_str(), response.status().as_u16(), start);
            response
        }
        Route::ConfigJs => state.config_js.response(),
        Route::Static => match state.static_files.clone().oneshot(request).await {
            Ok(response) => response.map(Body::new),
            Err(never) => match never {},
        },
        Route::NotFound => (StatusCode::NOT_FOUND, "Not Found").into_response(),
        Route::Unsupported => {
            (StatusCode::NOT_IMPLEMENTED, format!("Unsupported method ({})", method)).into_response()
        }
    }
}

async fn proxy(state: &AppState, request: Request<Body>) -> Result<Response, RelayError> {
    let proxied = ProxiedRequest::from_request(request, state.max_body_size).await?;
    relay::relay(state, proxied).await
}

//! Request classification subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (method + path-and-query)
//!     → matcher.rs (proxied script allow-list)
//!     → mod.rs::classify (Route)
//!     → http::server dispatches to relay / config.js / static files
//! ```
//!
//! # Design Decisions
//! - Classification is a pure function of method and target
//! - Proxied scripts take precedence over everything else

pub mod matcher;

use axum::http::Method;

pub use matcher::{ProxiedPaths, ScriptMatcher, PROXIED_PATHS};

/// Path of the generated client configuration script.
pub const CONFIG_JS_PATH: &str = "/config.js";

/// Where a request is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Relayed to the backend with the shared session.
    Proxied,
    /// Answered from the rendered `config.js`.
    ConfigJs,
    /// Served from the local web root.
    Static,
    /// A POST to anything but a proxied script.
    NotFound,
    /// Any method other than GET, HEAD or POST.
    Unsupported,
}

/// Classify a request by method and raw path-and-query.
pub fn classify(paths: &ProxiedPaths, method: &Method, target: &str) -> Route {
    let known = *method == Method::GET || *method == Method::HEAD || *method == Method::POST;
    if !known {
        return Route::Unsupported;
    }

    if paths.is_proxied(target) {
        return Route::Proxied;
    }

    if *method == Method::POST {
        Route::NotFound
    } else if target == CONFIG_JS_PATH {
        Route::ConfigJs
    } else {
        Route::Static
    }
}

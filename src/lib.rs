//! Session-injecting reverse proxy for a Bugzilla backend.
//!
//! A small set of backend scripts is relayed with one shared, bootstrapped
//! login session; everything else is served from a local web root.

// Core subsystems
pub mod backend;
pub mod config;
pub mod http;
pub mod routing;
pub mod session;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;

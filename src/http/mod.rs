//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (one task per connection)
//!     → server.rs (Axum setup, classification via routing)
//!     → request.rs (capture method, target, headers, declared body)
//!     → relay.rs (backend exchange, session injected by security::headers)
//!     → redirect.rs (302/303 → GET, loop and depth checks)
//!     → response.rs (header rewrite, Expires, exact Content-Length)
//!     → Send to client
//!
//! config_js.rs answers /config.js; everything else not proxied comes from
//! the static web root.
//! ```

pub mod config_js;
pub mod redirect;
pub mod relay;
pub mod request;
pub mod response;
pub mod server;

pub use config_js::ConfigJs;
pub use redirect::{RedirectChain, MAX_REDIRECTS};
pub use relay::RelayError;
pub use request::ProxiedRequest;
pub use server::{AppState, HttpServer};

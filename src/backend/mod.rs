//! Backend subsystem.
//!
//! # Data Flow
//! ```text
//! bugzilla_url (config)
//!     → target.rs (scheme, host, port, path prefix)
//!     → shared via Arc with the relay and the session bootstrapper
//!
//! client.rs builds the relay client (hyper) and the login client (reqwest)
//! ```

pub mod client;
pub mod target;

pub use client::{build_client, build_relay_client, RelayClient};
pub use target::{BackendTarget, Scheme};

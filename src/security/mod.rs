//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! client request headers
//!     → headers.rs::outbound (strip client identity, inject session)
//!     → backend
//! backend response headers
//!     → headers.rs::inbound (strip backend session, regenerated headers)
//!     → client
//! ```
//!
//! # Design Decisions
//! - The shared backend session must never leak to clients
//! - Clients must never be able to substitute their own session or origin

pub mod headers;

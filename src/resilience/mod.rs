//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend:
//!     → timeouts.rs (connect / exchange deadline on the backend client)
//! Client request:
//!     → timeouts.rs (overall deadline, enforced by the HTTP layer)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No retries: a failed backend exchange fails the one client request

pub mod timeouts;

pub use timeouts::TimeoutPolicy;

//! Backend session bootstrap subsystem.
//!
//! # Data Flow
//! ```text
//! startup (before the listener is bound)
//!     → login.rs (policy: credentials? loopback bind?)
//!     → xmlrpc.rs (User.login call, response headers → inspection hook)
//!     → cookie.rs (Set-Cookie → client-style Cookie value)
//!     → Option<SessionCookie> published read-only to every request handler
//! ```
//!
//! # Design Decisions
//! - One shared backend identity for all proxied traffic
//! - Absence of a session means anonymous proxying, never an error

pub mod cookie;
pub mod login;
pub mod xmlrpc;

use thiserror::Error;

pub use self::cookie::SessionCookie;
pub use self::login::{bootstrap, login};

/// Why a login attempt did not produce a session.
#[derive(Debug, Error)]
pub enum LoginError {
    /// The RPC server answered with a fault.
    #[error("{message} (fault {code})")]
    Fault { code: i32, message: String },

    /// The HTTP exchange succeeded but with a non-200 status.
    #[error("{status} {reason}")]
    Protocol { status: u16, reason: String },

    /// Connecting, sending or reading failed.
    #[error("{0}")]
    Transport(#[source] reqwest::Error),

    /// The reply was not an XML-RPC response.
    #[error("malformed reply: {0}")]
    Malformed(String),
}

impl LoginError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            LoginError::Fault { .. } => "fault",
            LoginError::Protocol { .. } => "protocol_error",
            LoginError::Transport(_) => "transport_error",
            LoginError::Malformed(_) => "malformed",
        }
    }
}

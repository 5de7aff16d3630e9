//! Backend location.
//!
//! # Responsibilities
//! - Resolve the configured backend base URL into scheme/host/port/path prefix
//! - Build absolute backend URLs for incoming request paths
//!
//! # Design Decisions
//! - Resolved once at startup; immutable afterwards
//! - Request paths are appended verbatim, never normalized

use std::fmt;

use url::Url;

use crate::config::ConfigError;

/// Backend URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    /// Port used when the URL does not name one.
    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where every proxied request goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendTarget {
    pub scheme: Scheme,
    pub hostname: String,
    pub port: u16,
    /// Path of the base URL without its trailing slash ("" for a bare host).
    pub path_prefix: String,
    explicit_port: bool,
}

impl BackendTarget {
    /// Parse a configured backend URL such as `https://bugzilla.example.org/bz`.
    pub fn parse(base_url: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(base_url).map_err(|e| ConfigError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        let scheme = match url.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => return Err(ConfigError::BadScheme(other.to_string())),
        };

        let hostname = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ConfigError::InvalidUrl {
                url: base_url.to_string(),
                reason: "missing host".to_string(),
            })?
            .to_string();

        let port = url.port().unwrap_or_else(|| scheme.default_port());

        Ok(Self {
            scheme,
            hostname,
            port,
            path_prefix: url.path().trim_end_matches('/').to_string(),
            explicit_port: url.port().is_some(),
        })
    }

    /// Backend path for a client path: prefix and path concatenated as-is.
    pub fn path_for(&self, request_path: &str) -> String {
        format!("{}{}", self.path_prefix, request_path)
    }

    /// Absolute backend URL for a client path.
    pub fn url_for(&self, request_path: &str) -> String {
        format!("{}{}", self.origin(), self.path_for(request_path))
    }

    /// `scheme://host[:port]`, with the port only when it was configured.
    pub fn origin(&self) -> String {
        if self.explicit_port {
            format!("{}://{}:{}", self.scheme, self.hostname, self.port)
        } else {
            format!("{}://{}", self.scheme, self.hostname)
        }
    }
}

impl fmt::Display for BackendTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.origin(), self.path_prefix)
    }
}

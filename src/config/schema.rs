//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::PathBuf;

use serde::Deserialize;

use crate::config::loader::ConfigError;
use crate::config::validation::validate_site;

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Name of the configuration used when none is given on the command line.
    pub default_config: Option<String>,

    /// Named site configurations (one backend + identity each).
    pub configs: BTreeMap<String, SiteConfig>,

    /// Local serving settings.
    pub server: ServerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ProxyConfig {
    /// Resolve a named configuration, falling back to `default_config`, and
    /// validate it.
    pub fn select(&self, name: Option<&str>) -> Result<(String, SiteConfig), ConfigError> {
        let name = match name.or(self.default_config.as_deref()) {
            Some(name) => name,
            None => return Err(ConfigError::NoConfigName),
        };

        let site = self
            .configs
            .get(name)
            .ok_or_else(|| ConfigError::UnknownConfig(name.to_string()))?;
        validate_site(name, site).map_err(ConfigError::Validation)?;

        Ok((name.to_string(), site.clone()))
    }
}

/// One backend installation and the identity used against it.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Base URL of the backend (e.g., "https://bugzilla.example.org").
    pub bugzilla_url: String,

    /// Login name; together with the password enables authenticated mode.
    #[serde(default)]
    pub bugzilla_login: Option<String>,

    #[serde(default)]
    pub bugzilla_password: Option<String>,

    /// Local bind address.
    #[serde(default = "default_proxy_bind")]
    pub proxy_bind: String,

    /// Local port.
    #[serde(default = "default_proxy_port")]
    pub proxy_port: u16,
}

fn default_proxy_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_proxy_port() -> u16 {
    23080
}

impl SiteConfig {
    /// Login and password, if both are configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.bugzilla_login, &self.bugzilla_password) {
            (Some(login), Some(password)) => Some((login.as_str(), password.as_str())),
            _ => None,
        }
    }

    /// True when the proxy only accepts connections from this host.
    pub fn binds_loopback(&self) -> bool {
        if self.proxy_bind.eq_ignore_ascii_case("localhost") {
            return true;
        }
        self.proxy_bind
            .parse::<IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false)
    }
}

/// Local serving configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Directory holding the static UI bundle and the `config.js` template.
    pub web_root: PathBuf,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            web_root: PathBuf::from("web"),
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Timeout configuration for backend traffic.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Backend connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// One backend exchange (request sent, full response read) in seconds.
    pub backend_secs: u64,

    /// Whole client request, redirect hops included, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            backend_secs: 60,
            request_secs: 300,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

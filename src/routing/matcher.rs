//! Proxied-path matching.
//!
//! # Responsibilities
//! - Decide whether a request target belongs to the backend or the local UI
//!
//! # Design Decisions
//! - A prefix matches only when the target equals it or continues with `?`,
//!   so `/show_bug.cgi` and `/show_bug.cgi?id=1` match, `/show_bug.cgiX` does not
//! - Matching is case-sensitive and runs on the raw path-and-query
//! - No regex to guarantee O(n) matching

/// Backend scripts relayed with the shared session.
///
/// This is not an access control list; it only separates what is proxied
/// from what is served from the local web root.
pub const PROXIED_PATHS: &[&str] = &["/attachment.cgi", "/process_bug.cgi", "/show_bug.cgi"];

/// Matches a request target against one script path.
#[derive(Debug, Clone)]
pub struct ScriptMatcher {
    prefix: String,
}

impl ScriptMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// True for the bare script path or the script path followed by a query.
    pub fn matches(&self, target: &str) -> bool {
        match target.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('?'),
            None => false,
        }
    }
}

/// The fixed set of proxied scripts.
#[derive(Debug, Clone)]
pub struct ProxiedPaths {
    matchers: Vec<ScriptMatcher>,
}

impl ProxiedPaths {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            matchers: paths.into_iter().map(ScriptMatcher::new).collect(),
        }
    }

    pub fn is_proxied(&self, target: &str) -> bool {
        self.matchers.iter().any(|m| m.matches(target))
    }
}

impl Default for ProxiedPaths {
    fn default() -> Self {
        Self::new(PROXIED_PATHS.iter().copied())
    }
}

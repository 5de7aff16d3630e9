//! Backend redirect chasing.
//!
//! 302 (Found) is treated like 303 (See Other): the target is fetched with a GET
//! whatever the original method was. The backend relies on this for attachment
//! downloads, which it bounces to a separate URL. 301 and 307 are relayed to the
//! client untouched.
//!
//! A chain is capped at [`MAX_REDIRECTS`] visited URLs, the first request
//! included, and fails as soon as a URL repeats.

use axum::http::{header, HeaderMap, StatusCode};
use url::Url;

use crate::http::relay::RelayError;

/// Maximum number of URLs one client request may visit.
pub const MAX_REDIRECTS: usize = 10;

/// The URLs visited while resolving one client request.
#[derive(Debug, Clone)]
pub struct RedirectChain {
    visited: Vec<Url>,
}

impl RedirectChain {
    /// Start a chain at the first proxied URL.
    pub fn new(start: Url) -> Self {
        Self {
            visited: vec![start],
        }
    }

    /// Decide what to do with a backend response.
    ///
    /// Returns the next URL to GET, or `None` when the response should be
    /// relayed to the client as is.
    pub fn next_hop(&mut self, status: StatusCode, headers: &HeaderMap) -> Result<Option<Url>, RelayError> {
        if status != StatusCode::FOUND && status != StatusCode::SEE_OTHER {
            return Ok(None);
        }

        let location = match headers.get(header::LOCATION) {
            Some(value) => value
                .to_str()
                .map_err(|_| RelayError::InvalidLocation("non-ASCII Location header".to_string()))?,
            None => return Ok(None),
        };
        if location.is_empty() {
            return Ok(None);
        }

        let next = self
            .current()
            .join(location)
            .map_err(|e| RelayError::InvalidLocation(format!("{}: {}", location, e)))?;

        if self.visited.contains(&next) || self.visited.len() >= MAX_REDIRECTS {
            return Err(RelayError::RedirectLoop {
                hops: self.visited.len(),
            });
        }

        self.visited.push(next.clone());
        Ok(Some(next))
    }

    /// The URL whose response is being examined.
    pub fn current(&self) -> &Url {
        // never empty: seeded in `new`
        &self.visited[self.visited.len() - 1]
    }

    /// Number of redirects followed so far.
    pub fn hops(&self) -> usize {
        self.visited.len() - 1
    }

    pub fn visited(&self) -> &[Url] {
        &self.visited
    }
}

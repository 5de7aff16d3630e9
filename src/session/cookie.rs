//! Session cookie translation.
//!
//! The backend hands out its session as `Set-Cookie` headers; the proxy replays
//! it as one client-style `Cookie` header. Cookie attributes in a `Cookie`
//! header are written `$Attribute=value` so they cannot be mistaken for cookie
//! names: `name=val; $Path=val; name=val; $Domain=val`.

use std::fmt;

use axum::http::{header, HeaderMap, HeaderValue};
use cookie::Cookie;

/// The bootstrapped backend session, ready to be sent as a `Cookie` header.
///
/// Written once before the server accepts connections; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie(String);

impl SessionCookie {
    /// Build the `Cookie` value from every `Set-Cookie` header in `headers`.
    ///
    /// Returns `None` when the response set no cookies.
    pub fn from_response_headers(headers: &HeaderMap) -> Option<Self> {
        let values = headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok());
        Self::from_set_cookies(values)
    }

    /// Build the `Cookie` value from raw `Set-Cookie` strings.
    ///
    /// A later cookie with an already seen name replaces the earlier one in place.
    pub fn from_set_cookies<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        let mut jar: Vec<(Cookie<'a>, &'a str)> = Vec::new();
        for raw in values {
            match Cookie::parse(raw) {
                Ok(cookie) => match jar.iter_mut().find(|(c, _)| c.name() == cookie.name()) {
                    Some(existing) => *existing = (cookie, raw),
                    None => jar.push((cookie, raw)),
                },
                Err(e) => tracing::debug!(error = %e, "Ignoring unparseable Set-Cookie"),
            }
        }

        if jar.is_empty() {
            return None;
        }

        let mut pairs = Vec::with_capacity(jar.len());
        for (cookie, raw) in &jar {
            let mut pair = format!("{}={}", cookie.name(), cookie.value());
            if let Some(path) = cookie.path().filter(|p| !p.is_empty()) {
                pair.push_str("; $Path=");
                pair.push_str(&quote(path));
            }
            if let Some(domain) = cookie.domain().filter(|d| !d.is_empty()) {
                pair.push_str("; $Domain=");
                pair.push_str(&quote(&sent_domain(raw, domain)));
            }
            pairs.push(pair);
        }

        Some(Self(pairs.join("; ")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Header value for outbound requests; `None` if it holds bytes a header can't carry.
    pub fn header_value(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.0).ok()
    }
}

impl fmt::Display for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The domain as the server sent it: `Cookie::domain` drops a leading dot.
fn sent_domain(raw: &str, domain: &str) -> String {
    let dotted = raw.split(';').skip(1).any(|attr| {
        attr.split_once('=').is_some_and(|(key, value)| {
            key.trim().eq_ignore_ascii_case("domain") && value.trim().starts_with('.')
        })
    });

    if dotted {
        format!(".{}", domain)
    } else {
        domain.to_string()
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~:".contains(c)
}

/// Quote an attribute value unless it is a plain cookie token.
fn quote(value: &str) -> String {
    if value.chars().all(is_token_char) {
        return value.to_string();
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

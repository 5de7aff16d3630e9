//! The generated `/config.js` endpoint.
//!
//! The UI reads its settings from `config.js` in the web root, a template with
//! two tokens: the backend URL and a note shown to users of an anonymous
//! (read-only) instance. It is rendered once at startup.

use std::fs;
use std::path::Path;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use chrono::{DateTime, Utc};

use crate::config::ConfigError;
use crate::http::response::{http_date, SERVER_NAME};

pub const TEMPLATE_FILE: &str = "config.js";
pub const URL_TOKEN: &str = "@@BUGZILLA_URL@@";
pub const NOTE_TOKEN: &str = "@@NOTE@@";

/// Note rendered when the proxy has no backend session.
pub const ANONYMOUS_NOTE: &str =
    "This is a read-only demo instance of Splinter; you will not be able to publish your reviews";

/// Rendered `config.js`, immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct ConfigJs {
    content: Bytes,
    last_modified: String,
}

impl ConfigJs {
    /// Read the template from the web root.
    pub fn read_template(web_root: &Path) -> Result<String, ConfigError> {
        let path = web_root.join(TEMPLATE_FILE);
        fs::read_to_string(&path).map_err(|_| ConfigError::MissingTemplate(path))
    }

    /// Substitute the backend URL and the note. `started` becomes `Last-Modified`.
    pub fn render(template: &str, bugzilla_url: &str, authenticated: bool, started: DateTime<Utc>) -> Self {
        let note = if authenticated { "" } else { ANONYMOUS_NOTE };
        let content = template.replace(URL_TOKEN, bugzilla_url).replace(NOTE_TOKEN, note);

        Self {
            content: Bytes::from(content),
            last_modified: http_date(started),
        }
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// The response for GET and HEAD; the server drops the body for HEAD.
    pub fn response(&self) -> Response {
        let mut response = Response::new(Body::from(self.content.clone()));
        *response.status_mut() = StatusCode::OK;

        let headers = response.headers_mut();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/javascript"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(self.content.len()));
        headers.insert(header::SERVER, HeaderValue::from_static(SERVER_NAME));
        if let Ok(value) = HeaderValue::from_str(&self.last_modified) {
            headers.insert(header::LAST_MODIFIED, value);
        }

        response
    }
}

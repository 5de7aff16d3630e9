//! One-shot backend login.
//!
//! # Responsibilities
//! - Decide whether logging in is allowed (credentials present, loopback bind)
//! - Call `User.login` over the backend's XML-RPC endpoint
//! - Harvest the session cookie from the login reply headers
//!
//! # Design Decisions
//! - Login happens once per process start; cookies are never persisted
//! - Every failure is logged and leaves the proxy anonymous; none is fatal

use crate::backend::BackendTarget;
use crate::config::SiteConfig;
use crate::observability::metrics;
use crate::session::xmlrpc::{Value, XmlRpcTransport};
use crate::session::{LoginError, SessionCookie};

/// Path of the backend RPC endpoint, relative to the backend base URL.
pub const RPC_PATH: &str = "/xmlrpc.cgi";

/// Log in with `login`/`password` and return the backend session cookie.
///
/// A successful call that sets no cookie yields `Ok(None)`.
pub async fn login(
    client: &reqwest::Client,
    target: &BackendTarget,
    login: &str,
    password: &str,
) -> Result<Option<SessionCookie>, LoginError> {
    let transport = XmlRpcTransport::new(client, target.url_for(RPC_PATH));

    // 'remember: false' keeps the server from sending a persistent cookie
    let params = [Value::Struct(vec![
        ("login".to_string(), Value::String(login.to_string())),
        ("password".to_string(), Value::String(password.to_string())),
        ("remember".to_string(), Value::Boolean(false)),
    ])];

    let mut harvested = None;
    transport
        .call("User.login", &params, |headers| {
            harvested = SessionCookie::from_response_headers(headers);
        })
        .await?;

    Ok(harvested)
}

/// Run the startup login policy for a site.
///
/// Returns the session to inject into every proxied request, or `None` to
/// proxy anonymously.
pub async fn bootstrap(
    client: &reqwest::Client,
    target: &BackendTarget,
    site: &SiteConfig,
) -> Option<SessionCookie> {
    let (user, password) = site.credentials()?;

    if !site.binds_loopback() {
        // anybody able to reach the proxy could act as this account
        tracing::warn!(
            proxy_bind = %site.proxy_bind,
            "proxy_bind is not a loopback address; refusing to log in with private login/password"
        );
        return None;
    }

    match login(client, target, user, password).await {
        Ok(Some(cookie)) => {
            tracing::info!(url = %site.bugzilla_url, "Successfully logged into {}", site.bugzilla_url);
            metrics::record_login("success");
            Some(cookie)
        }
        Ok(None) => {
            tracing::warn!(url = %site.bugzilla_url, "Login reply carried no session cookie");
            metrics::record_login("no_cookie");
            None
        }
        Err(e) => {
            tracing::warn!(url = %site.bugzilla_url, error = %e, "Can't log in to {}: {}", site.bugzilla_url, e);
            metrics::record_login(e.kind());
            None
        }
    }
}

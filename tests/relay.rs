//! End-to-end relay tests: client → proxy → mock backend.

use std::fs;
use std::time::Duration;

use axum::http::{header, StatusCode};
use chrono::{NaiveDateTime, TimeZone, Utc};

use bz_session_proxy::resilience::TimeoutPolicy;

use common::{client, raw_get, session, start_backend, start_proxy, start_proxy_with, MockResponse};

mod common;

fn expires_in(response: &reqwest::Response) -> Option<chrono::Duration> {
    let value = response.headers().get(header::EXPIRES)?.to_str().ok()?;
    let naive = NaiveDateTime::parse_from_str(value, "%a, %d %b %Y %H:%M:%S GMT").ok()?;
    Some(Utc.from_utc_datetime(&naive) - Utc::now())
}

fn id_param(target: &str) -> u32 {
    target
        .split("id=")
        .nth(1)
        .and_then(|v| v.split('&').next())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

#[tokio::test]
async fn test_show_bug_relayed() {
    let backend = start_backend(|_| {
        MockResponse::ok("ok")
            .with_header("Set-Cookie", "Bugzilla_logincookie=leak; path=/")
            .with_header("X-Backend", "yes")
    })
    .await;
    let web = tempfile::tempdir().unwrap();
    let proxy = start_proxy(&backend.url(), Some(session("Bugzilla_logincookie=abc")), web.path()).await;

    let res = client().get(proxy.url("/show_bug.cgi?id=1")).send().await.expect("Proxy unreachable");

    assert_eq!(res.status(), 200);
    assert!(res.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(res.headers().get(header::CONTENT_LENGTH).unwrap(), "2");
    assert_eq!(res.headers().get("x-backend").unwrap(), "yes");
    assert_ne!(res.headers().get(header::SERVER).unwrap(), "MockBugzilla");
    assert!(expires_in(&res).is_none(), "authenticated bug pages get no Expires");
    assert_eq!(res.text().await.unwrap(), "ok");

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].target, "/show_bug.cgi?id=1");
}

#[tokio::test]
async fn test_client_cookies_replaced_by_session() {
    let backend = start_backend(|_| MockResponse::ok("ok")).await;
    let web = tempfile::tempdir().unwrap();
    let proxy = start_proxy(&backend.url(), Some(session("Bugzilla_logincookie=abc")), web.path()).await;

    let res = client()
        .get(proxy.url("/show_bug.cgi?id=2"))
        .header(header::COOKIE, "Bugzilla_logincookie=forged")
        .header("X-Forwarded-Host", "attacker.example")
        .header("X-Forwarded-Server", "attacker.example")
        .header(header::ACCEPT_LANGUAGE, "de")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let request = &backend.requests()[0];
    assert_eq!(request.header_count("cookie"), 1);
    assert_eq!(request.header("cookie"), Some("Bugzilla_logincookie=abc"));
    assert_eq!(request.header("x-forwarded-host"), None);
    assert_eq!(request.header("x-forwarded-server"), None);
    assert_eq!(request.header("accept-language"), Some("de"));
    assert_eq!(request.header("host"), Some(backend.addr.to_string().as_str()));
}

#[tokio::test]
async fn test_anonymous_sends_no_cookie_and_expires_soon() {
    let backend = start_backend(|_| MockResponse::ok("public")).await;
    let web = tempfile::tempdir().unwrap();
    let proxy = start_proxy(&backend.url(), None, web.path()).await;

    let res = client()
        .get(proxy.url("/show_bug.cgi?id=3"))
        .header(header::COOKIE, "mine=1")
        .send()
        .await
        .unwrap();

    let ahead = expires_in(&res).expect("anonymous GET gets an Expires");
    assert!(ahead > chrono::Duration::minutes(4));
    assert!(ahead <= chrono::Duration::minutes(5));
    assert_eq!(backend.requests()[0].header("cookie"), None);
}

#[tokio::test]
async fn test_attachment_redirect_followed() {
    let backend = start_backend(|req| {
        if req.target == "/attachment.cgi?id=5" {
            MockResponse::redirect(303, "/attachment.cgi?id=5&final=1")
        } else {
            MockResponse::ok("PATCH CONTENT").with_header("Content-Type", "text/x-diff")
        }
    })
    .await;
    let web = tempfile::tempdir().unwrap();
    let proxy = start_proxy(&backend.url(), Some(session("Bugzilla_logincookie=abc")), web.path()).await;

    let res = client().get(proxy.url("/attachment.cgi?id=5")).send().await.unwrap();

    assert_eq!(res.status(), 200);
    let ahead = expires_in(&res).expect("attachments get an Expires");
    assert!(ahead > chrono::Duration::days(30));
    assert!(ahead <= chrono::Duration::days(31));
    assert_eq!(res.text().await.unwrap(), "PATCH CONTENT");

    let requests = backend.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].method, "GET");
    assert_eq!(requests[1].target, "/attachment.cgi?id=5&final=1");
    assert_eq!(requests[1].header("cookie"), Some("Bugzilla_logincookie=abc"));
}

#[tokio::test]
async fn test_post_redirect_becomes_get() {
    let backend = start_backend(|req| {
        if req.method == "POST" {
            MockResponse::redirect(302, "/show_bug.cgi?id=7")
        } else {
            MockResponse::ok("updated")
        }
    })
    .await;
    let web = tempfile::tempdir().unwrap();
    let proxy = start_proxy(&backend.url(), Some(session("s=1")), web.path()).await;

    let res = client()
        .post(proxy.url("/process_bug.cgi"))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body("id=7&comment=hello")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "updated");

    let requests = backend.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].body, b"id=7&comment=hello");
    assert_eq!(requests[0].header("content-length"), Some("18"));
    assert_eq!(requests[1].method, "GET");
    assert!(requests[1].body.is_empty());
    assert!(matches!(requests[1].header("content-length"), None | Some("0")));
}

#[tokio::test]
async fn test_nine_redirects_succeed() {
    let backend = start_backend(|req| {
        let id = id_param(&req.target);
        if id < 9 {
            MockResponse::redirect(302, &format!("/show_bug.cgi?id={}", id + 1))
        } else {
            MockResponse::ok("final")
        }
    })
    .await;
    let web = tempfile::tempdir().unwrap();
    let proxy = start_proxy(&backend.url(), Some(session("s=1")), web.path()).await;

    let res = client().get(proxy.url("/show_bug.cgi?id=0")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "final");
    assert_eq!(backend.requests().len(), 10);
}

#[tokio::test]
async fn test_tenth_redirect_rejected() {
    let backend = start_backend(|req| {
        let id = id_param(&req.target);
        MockResponse::redirect(302, &format!("/show_bug.cgi?id={}", id + 1))
    })
    .await;
    let web = tempfile::tempdir().unwrap();
    let proxy = start_proxy(&backend.url(), Some(session("s=1")), web.path()).await;

    let res = client().get(proxy.url("/show_bug.cgi?id=0")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(res.text().await.unwrap().contains("Circular redirection"));
    assert_eq!(backend.requests().len(), 10);
}

#[tokio::test]
async fn test_circular_redirect_rejected() {
    let backend = start_backend(|req| {
        if req.target.contains("id=1") {
            MockResponse::redirect(302, "/show_bug.cgi?id=2")
        } else {
            MockResponse::redirect(303, "/show_bug.cgi?id=1")
        }
    })
    .await;
    let web = tempfile::tempdir().unwrap();
    let proxy = start_proxy(&backend.url(), None, web.path()).await;

    let res = client().get(proxy.url("/show_bug.cgi?id=1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(backend.requests().len(), 2);
}

#[tokio::test]
async fn test_permanent_redirect_relayed() {
    let backend = start_backend(|_| MockResponse::redirect(301, "http://elsewhere.example/")).await;
    let web = tempfile::tempdir().unwrap();
    let proxy = start_proxy(&backend.url(), None, web.path()).await;

    let res = client().get(proxy.url("/show_bug.cgi?id=1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(res.headers().get(header::LOCATION).unwrap(), "http://elsewhere.example/");
}

#[tokio::test]
async fn test_chunked_backend_response_gets_length() {
    let backend = start_backend(|_| MockResponse::ok("chunked body").chunked()).await;
    let web = tempfile::tempdir().unwrap();
    let proxy = start_proxy(&backend.url(), None, web.path()).await;

    let res = client().get(proxy.url("/show_bug.cgi?id=1")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().get(header::TRANSFER_ENCODING).is_none());
    assert_eq!(res.headers().get(header::CONTENT_LENGTH).unwrap(), "12");
    assert_eq!(res.text().await.unwrap(), "chunked body");
}

#[tokio::test]
async fn test_backend_unreachable() {
    let closed = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = closed.local_addr().unwrap();
    drop(closed);

    let web = tempfile::tempdir().unwrap();
    let proxy = start_proxy(&format!("http://{}", addr), None, web.path()).await;

    let res = client().get(proxy.url("/show_bug.cgi?id=1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_local_routes() {
    let backend = start_backend(|_| MockResponse::ok("backend")).await;
    let web = tempfile::tempdir().unwrap();
    fs::write(web.path().join("index.html"), "<html>review</html>").unwrap();
    let proxy = start_proxy(&backend.url(), None, web.path()).await;
    let client = client();

    let res = client.get(proxy.url("/index.html")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "<html>review</html>");

    let res = client.get(proxy.url("/config.js")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers().get(header::CONTENT_TYPE).unwrap(), "text/javascript");
    assert!(res.headers().get(header::LAST_MODIFIED).is_some());
    let js = res.text().await.unwrap();
    assert!(js.contains(&backend.url()));
    assert!(js.contains("read-only"));

    let res = client.head(proxy.url("/config.js")).send().await.unwrap();
    assert_eq!(res.status(), 200);

    let res = client.post(proxy.url("/index.html")).body("x").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.get(proxy.url("/show_bug.cgiX")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.put(proxy.url("/show_bug.cgi")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_IMPLEMENTED);

    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_request_target_forwarded_verbatim() {
    let backend = start_backend(|_| MockResponse::ok("found")).await;
    let web = tempfile::tempdir().unwrap();
    let proxy = start_proxy(&backend.url(), None, web.path()).await;

    let (status, body) = raw_get(proxy.addr, "/show_bug.cgi?id=it's&ctype=xml%20x").await;
    assert_eq!(status, 200);
    assert_eq!(body, "found");

    let requests = backend.requests();
    assert_eq!(requests[0].target, "/show_bug.cgi?id=it's&ctype=xml%20x");
}

#[tokio::test]
async fn test_head_relayed_with_backend_length() {
    let backend = start_backend(|_| MockResponse::ok("twelve bytes")).await;
    let web = tempfile::tempdir().unwrap();
    let proxy = start_proxy(&backend.url(), Some(session("s=1")), web.path()).await;

    let res = client().head(proxy.url("/show_bug.cgi?id=4")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers().get(header::CONTENT_LENGTH).unwrap(), "12");
    assert!(expires_in(&res).is_none());
    assert!(res.bytes().await.unwrap().is_empty());

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "HEAD");
}

#[tokio::test]
async fn test_head_redirect_followed_with_get() {
    let backend = start_backend(|req| {
        if req.target == "/attachment.cgi?id=8" {
            MockResponse::redirect(302, "/attachment.cgi?id=8&final=1")
        } else {
            MockResponse::ok("attachment")
        }
    })
    .await;
    let web = tempfile::tempdir().unwrap();
    let proxy = start_proxy(&backend.url(), None, web.path()).await;

    let res = client().head(proxy.url("/attachment.cgi?id=8")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers().get(header::CONTENT_LENGTH).unwrap(), "10");
    // only GETs get a fabricated Expires
    assert!(expires_in(&res).is_none());

    let requests = backend.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, "HEAD");
    assert_eq!(requests[1].method, "GET");
}

#[tokio::test]
async fn test_slow_backend_exchange_times_out() {
    let backend = start_backend(|_| MockResponse::ok("late").delayed(Duration::from_secs(3))).await;
    let web = tempfile::tempdir().unwrap();
    let policy = TimeoutPolicy {
        connect: Duration::from_secs(2),
        backend: Duration::from_secs(1),
        request: Duration::from_secs(10),
    };
    let proxy = start_proxy_with(&backend.url(), None, web.path(), policy).await;

    let res = client().get(proxy.url("/show_bug.cgi?id=1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(res.text().await.unwrap(), "Backend timed out");
}

#[tokio::test]
async fn test_whole_request_deadline_is_gateway_timeout() {
    let backend = start_backend(|_| MockResponse::ok("late").delayed(Duration::from_millis(2500))).await;
    let web = tempfile::tempdir().unwrap();
    let policy = TimeoutPolicy {
        connect: Duration::from_secs(2),
        backend: Duration::from_secs(10),
        request: Duration::from_secs(1),
    };
    let proxy = start_proxy_with(&backend.url(), None, web.path(), policy).await;

    let res = client().get(proxy.url("/show_bug.cgi?id=1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
}

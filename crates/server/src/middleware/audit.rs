//! Audit trail for dashboard actions

use axum::{body::Body, extract::Request, http::Method, middleware::Next, response::Response};
use axum_extra::extract::cookie::CookieJar;

use super::request_id::RequestId;
use crate::state::SESSION_COOKIE;

/// Session id as sent by the browser, if any
fn session_label(request: &Request<Body>) -> String {
    CookieJar::from_headers(request.headers())
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .unwrap_or_else(|| "new".to_string())
}

/// Logs every form action with its session and outcome.
///
/// Form bodies carry patient data and are never logged.
pub async fn audit_middleware(request: Request<Body>, next: Next) -> Response {
    if request.method() != Method::POST {
        return next.run(request).await;
    }

    let action = request.uri().path().to_string();
    let session = session_label(&request);
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let response = next.run(request).await;

    let status = response.status();
    tracing::info!(
        target: "audit",
        request_id = %request_id,
        session = %session,
        action = %action,
        status = status.as_u16(),
        accepted = status.is_redirection(),
        "Dashboard action"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    fn request_with_cookie(cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri("/reset");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_session_label_reads_session_cookie() {
        let request = request_with_cookie(Some(
            "theme=dark; indogen_session=0f8e2c1a-5b7d-4c3e-9a21-6d4b8f0e1c2a; lang=id",
        ));
        assert_eq!(
            session_label(&request),
            "0f8e2c1a-5b7d-4c3e-9a21-6d4b8f0e1c2a"
        );
    }

    #[test]
    fn test_session_label_without_cookie() {
        assert_eq!(session_label(&request_with_cookie(None)), "new");
        assert_eq!(
            session_label(&request_with_cookie(Some("indogen_session_old=abc"))),
            "new"
        );
    }
}

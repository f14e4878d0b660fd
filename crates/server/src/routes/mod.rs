//! Dashboard routes

pub mod actions;
pub mod dashboard;
pub mod health;
pub mod metrics;

use axum::{
    Router,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

use crate::state::{AppState, SESSION_COOKIE};

/// Page, mode switching, reset and download
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::show))
        .route("/mode", post(actions::select_mode))
        .route("/reset", post(actions::reset))
        .route("/report/download", get(actions::download))
}

/// Routes that start a completion call; rate limited by the caller
pub fn analysis_routes() -> Router<AppState> {
    Router::new()
        .route("/submit/manual", post(actions::submit_manual))
        .route("/submit/stored", post(actions::submit_stored))
        .route("/analysis", post(actions::trigger))
}

/// Session id from the cookie, issuing a new one when absent or invalid
pub(crate) fn session_id(jar: CookieJar) -> (CookieJar, Uuid) {
    if let Some(id) = jar
        .get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
    {
        return (jar, id);
    }

    let id = Uuid::new_v4();
    let cookie = Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    tracing::debug!(session = %id, "New dashboard session");
    (jar.add(cookie), id)
}

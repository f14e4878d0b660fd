//! Dashboard page handler

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use indogen_core::{InputMode, PatientRecord, PatientStore, SessionState};
use serde::Deserialize;

use super::session_id;
use crate::error::AppError;
use crate::state::AppState;
use crate::view::{self, DashboardView, Notice};

/// Query parameters for the dashboard page
#[derive(Debug, Deserialize, Default)]
pub struct DashboardQuery {
    /// Stored patient to preview in the sidebar
    pub patient: Option<String>,
    /// Any value previews a random stored patient
    pub random: Option<String>,
}

/// GET / - Render the dashboard for the current session
pub async fn show(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<DashboardQuery>,
) -> (CookieJar, Html<String>) {
    let (jar, id) = session_id(jar);
    let session = state.sessions.snapshot(id).await;
    let html = render(&state, &session, query, None).await;
    (jar, Html(html))
}

/// Re-render the dashboard with the error shown inline, keeping its status code
pub(crate) async fn rejected(
    state: &AppState,
    session: &SessionState,
    err: impl Into<AppError>,
) -> Response {
    let err = err.into();
    let notice = match &err {
        AppError::Unprocessable(msg) => Notice::warning(msg.clone()),
        other => Notice::error(other.message()),
    };
    let html = render(state, session, DashboardQuery::default(), Some(&notice)).await;
    (err.status(), Html(html)).into_response()
}

pub(crate) async fn render(
    state: &AppState,
    session: &SessionState,
    query: DashboardQuery,
    notice: Option<&Notice>,
) -> String {
    let show_preview = session.mode() == InputMode::Store;
    let submitted = session.record().map(|r| r.name.clone());

    let loaded = state
        .read_store(move |store| {
            let names = store.names()?;
            let preview = if show_preview {
                resolve_preview(store, &query, submitted.as_deref())
            } else {
                None
            };
            Ok((names, preview))
        })
        .await;

    let (patients, preview) = match loaded {
        Ok((names, preview)) => (Ok(names), preview),
        Err(e) => {
            tracing::warn!(error = %e, "Patient store unavailable");
            (Err(e), None)
        }
    };

    view::dashboard(&DashboardView {
        session,
        patients: &patients,
        preview: preview.as_ref(),
        notice,
        config_error: state.config_error(),
    })
}

/// Which stored patient the sidebar shows: random pick, explicit choice,
/// the session's submitted patient, then the first in the file
fn resolve_preview(
    store: &PatientStore,
    query: &DashboardQuery,
    submitted: Option<&str>,
) -> Option<PatientRecord> {
    if query.random.is_some() {
        if let Ok(patient) = store.pick_random() {
            return Some(patient);
        }
    }

    if let Some(name) = query.patient.as_deref().or(submitted) {
        match store.find_by_name(name) {
            Ok(patient) => return Some(patient),
            Err(e) => tracing::debug!(error = %e, "Preview lookup missed, using first patient"),
        }
    }

    store.load_all().ok()?.into_iter().next()
}

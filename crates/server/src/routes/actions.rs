//! Form actions: mode selection, submissions, analysis trigger, reset, download
//!
//! Successful actions redirect back to `/` so a browser refresh never repeats
//! a completion call. Rejected actions re-render the dashboard with the
//! reason inline and an error status.

use axum::{
    Form,
    extract::State,
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use indogen_core::{Effect, Event, InputMode, ManualForm, StoreOverrides};
use serde::Deserialize;
use uuid::Uuid;

use super::dashboard::rejected;
use super::session_id;
use crate::error::AppError;
use crate::state::AppState;

/// Form body for mode selection
#[derive(Deserialize)]
pub struct ModeForm {
    mode: InputMode,
}

/// Form body for a stored-patient selection
#[derive(Deserialize)]
pub struct StoredSelection {
    patient: String,
    #[serde(default)]
    medication: String,
    #[serde(default)]
    observation: String,
}

/// POST /mode - Switch between store and manual input
pub async fn select_mode(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ModeForm>,
) -> Response {
    let (jar, id) = session_id(jar);
    match state.sessions.apply(id, Event::SelectMode(form.mode)).await {
        Ok(_) => (jar, Redirect::to("/")).into_response(),
        Err((session, err)) => (jar, rejected(&state, &session, err).await).into_response(),
    }
}

/// POST /submit/manual - Commit the manual form, then analyse
pub async fn submit_manual(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ManualForm>,
) -> Response {
    let (jar, id) = session_id(jar);

    if let Err((session, err)) = state.sessions.apply(id, Event::SubmitManual(form)).await {
        tracing::info!(error = %err, "Manual submission rejected");
        return (jar, rejected(&state, &session, err).await).into_response();
    }

    (jar, analyze(&state, id).await).into_response()
}

/// POST /submit/stored - Select a stored patient with overrides, then analyse
pub async fn submit_stored(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(selection): Form<StoredSelection>,
) -> Response {
    let (jar, id) = session_id(jar);

    let patient = selection.patient.clone();
    let lookup = state.read_store(move |store| store.find_by_name(&patient)).await;
    let record = match lookup {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!(error = %e, "Stored patient selection failed");
            let session = state.sessions.snapshot(id).await;
            return (jar, rejected(&state, &session, e).await).into_response();
        }
    };

    let event = Event::SelectStored {
        record,
        overrides: StoreOverrides {
            medication: selection.medication,
            observation: selection.observation,
        },
    };
    if let Err((session, err)) = state.sessions.apply(id, event).await {
        tracing::info!(error = %err, "Stored selection rejected");
        return (jar, rejected(&state, &session, err).await).into_response();
    }

    (jar, analyze(&state, id).await).into_response()
}

/// POST /analysis - Run the analysis again on the retained record
pub async fn trigger(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (jar, id) = session_id(jar);
    (jar, analyze(&state, id).await).into_response()
}

/// POST /reset - Clear record and report
pub async fn reset(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (jar, id) = session_id(jar);
    match state.sessions.apply(id, Event::Reset).await {
        Ok(_) => {
            tracing::info!(session = %id, "Dashboard reset");
            (jar, Redirect::to("/")).into_response()
        }
        Err((session, err)) => (jar, rejected(&state, &session, err).await).into_response(),
    }
}

/// GET /report/download - Raw report text as an attachment
pub async fn download(State(state): State<AppState>, jar: CookieJar) -> Result<Response, AppError> {
    let (jar, id) = session_id(jar);
    let (session, effect) = state
        .sessions
        .apply(id, Event::Download)
        .await
        .map_err(|(_, err)| AppError::from(err))?;

    let Effect::Download { text } = effect else {
        return Err(AppError::Internal("Download produced no report".to_string()));
    };

    let name = session.record().map(|r| r.name.as_str()).unwrap_or("pasien");
    let filename = format!(
        "indogen-report-{}-{}.txt",
        slug(name),
        chrono::Local::now().format("%Y%m%d")
    );

    Ok((
        jar,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        text,
    )
        .into_response())
}

/// Trigger analysis and run the completion call.
///
/// The call runs in its own task so a client disconnect cannot cancel it
/// halfway and leave the session stuck in `Processing`.
async fn analyze(state: &AppState, id: Uuid) -> Response {
    let client = match &state.client {
        Ok(client) => client.clone(),
        Err(e) => {
            let session = state.sessions.snapshot(id).await;
            return rejected(state, &session, e.clone()).await;
        }
    };

    let prompt = match state.sessions.apply(id, Event::TriggerAnalysis).await {
        Ok((_, Effect::Complete { prompt })) => prompt,
        Ok((session, effect)) => {
            tracing::error!(?effect, "Trigger produced no completion request");
            return rejected(
                state,
                &session,
                AppError::Internal("Analisis tidak dapat dimulai".to_string()),
            )
            .await;
        }
        Err((session, err)) => {
            tracing::info!(session = %id, error = %err, "Analysis trigger rejected");
            return rejected(state, &session, err).await;
        }
    };

    tracing::info!(session = %id, model = client.model_id(), "Starting clinical analysis");

    let sessions = state.sessions.clone();
    let task = tokio::spawn(async move {
        let outcome = client.complete(&prompt).await;
        let label = if outcome.is_ok() { "success" } else { "failure" };
        metrics::counter!("completion_requests_total", "outcome" => label).increment(1);

        match &outcome {
            Ok(text) => tracing::info!(session = %id, chars = text.len(), "Clinical analysis completed"),
            Err(e) => tracing::warn!(session = %id, error = %e, "Clinical analysis failed"),
        }

        if let Err((_, err)) = sessions.apply(id, Event::from(outcome)).await {
            tracing::error!(session = %id, error = %err, "Could not record completion outcome");
        }
    });

    if let Err(e) = task.await {
        tracing::error!(session = %id, error = %e, "Completion task aborted");
        let failed = Event::CompletionFailed(format!("Analisis terhenti: {e}"));
        if let Err((_, err)) = state.sessions.apply(id, failed).await {
            tracing::error!(session = %id, error = %err, "Could not record aborted analysis");
        }
    }

    Redirect::to("/").into_response()
}

/// Lowercase ASCII slug for file names
fn slug(name: &str) -> String {
    let mut out = String::new();
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    let out = out.trim_end_matches('-').to_string();
    if out.is_empty() { "pasien".to_string() } else { out }
}

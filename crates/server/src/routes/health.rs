//! Health check endpoint

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::state::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    store: ComponentHealth,
    completion: ComponentHealth,
    sessions: usize,
}

#[derive(Serialize)]
pub struct ComponentHealth {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

/// GET /health - Check the patient store and the completion credential
pub async fn check(State(state): State<AppState>) -> impl IntoResponse {
    let store = match state.read_store(|store| store.names()).await {
        Ok(names) => ComponentHealth {
            ok: true,
            detail: Some(format!("{} patients", names.len())),
        },
        Err(e) => {
            tracing::error!(error = %e, "Health check: patient store unavailable");
            ComponentHealth {
                ok: false,
                detail: Some(e.to_string()),
            }
        }
    };

    let completion = match &state.client {
        Ok(client) => ComponentHealth {
            ok: true,
            detail: Some(client.model_id().to_string()),
        },
        Err(e) => ComponentHealth {
            ok: false,
            detail: Some(e.to_string()),
        },
    };

    let healthy = store.ok && completion.ok;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if healthy { "healthy" } else { "degraded" }.to_string(),
            store,
            completion,
            sessions: state.sessions.count().await,
        }),
    )
}

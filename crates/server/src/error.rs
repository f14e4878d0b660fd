//! Application error handling

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use indogen_core::{ConfigError, DataSourceError, SessionError};
use thiserror::Error;

use crate::view;

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unprocessable(String),
    #[error("{0}")]
    ServiceUnavailable(String),
    #[error("{0}")]
    TooManyRequests(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::Conflict(msg)
            | AppError::Unprocessable(msg)
            | AppError::ServiceUnavailable(msg)
            | AppError::TooManyRequests(msg)
            | AppError::Internal(msg) => msg,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Html(view::error_page(status, self.message()))).into_response()
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        let msg = err.to_string();
        match err {
            SessionError::Validation(_) => AppError::Unprocessable(msg),
            SessionError::AnalysisInFlight => AppError::Conflict(msg),
            SessionError::NoReport => AppError::NotFound(msg),
            SessionError::NoRecord
            | SessionError::ModeMismatch { .. }
            | SessionError::InvalidTransition(_) => AppError::BadRequest(msg),
        }
    }
}

impl From<DataSourceError> for AppError {
    fn from(err: DataSourceError) -> Self {
        let msg = err.to_string();
        match err {
            DataSourceError::NotFound { .. } | DataSourceError::Lookup(_) => {
                AppError::NotFound(msg)
            }
            DataSourceError::Empty => AppError::NotFound(msg),
            DataSourceError::Unreadable { .. } | DataSourceError::Malformed { .. } => {
                AppError::Internal(msg)
            }
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::ServiceUnavailable(format!("Sistem gagal memverifikasi kredensial API: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indogen_core::ValidationError;

    #[test]
    fn test_session_error_statuses() {
        assert_eq!(
            AppError::from(SessionError::Validation(ValidationError::MissingRsid)).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::from(SessionError::AnalysisInFlight).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(SessionError::NoReport).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_config_error_message() {
        let err = AppError::from(ConfigError::MissingCredential("GEMINI_API_KEY".into()));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(err.message().contains("GEMINI_API_KEY"));
    }
}

use std::path::PathBuf;

use thiserror::Error;

use crate::patient::InputMode;
use crate::session::Phase;

/// Configuration problems detected at startup
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing API credential: {0} is not set")]
    MissingCredential(String),

    #[error("Invalid setting {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// Patient store failures (scoped to store mode)
#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("Database pasien tidak ditemukan: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Database pasien tidak dapat dibaca ({}): {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Format database pasien tidak valid ({}): {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Database pasien kosong")]
    Empty,

    #[error("Pasien bernama '{0}' tidak ditemukan")]
    Lookup(String),
}

/// Required field missing on submission
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Nama pasien wajib diisi.")]
    MissingName,

    #[error("Profil genetik (RSID) wajib diisi.")]
    MissingRsid,
}

/// Completion service failures. The message is shown to the user verbatim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("Quota exhausted ({status}): {message}")]
    QuotaExhausted { status: u16, message: String },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Rejected state transitions
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Analisis sedang berjalan untuk sesi ini")]
    AnalysisInFlight,

    #[error("Belum ada data pasien yang dikirim")]
    NoRecord,

    #[error("Laporan belum tersedia")]
    NoReport,

    #[error("Aksi ini memerlukan mode {expected}, sesi sedang dalam mode {actual}")]
    ModeMismatch {
        expected: InputMode,
        actual: InputMode,
    },

    #[error("Aksi tidak diizinkan pada fase {0:?}")]
    InvalidTransition(Phase),
}

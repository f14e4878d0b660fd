//! Shared application state and per-browser session storage

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use indogen_core::{
    CompletionClient, ConfigError, DataSourceError, Effect, Event, PatientStore, SessionError,
    SessionState,
};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Cookie carrying the session id
pub const SESSION_COOKIE: &str = "indogen_session";

/// Shared state injected into every handler
#[derive(Clone)]
pub struct AppState {
    pub store: PatientStore,
    /// `Err` when the credential was missing at startup; analysis stays disabled
    pub client: Result<Arc<dyn CompletionClient>, ConfigError>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(store: PatientStore, client: Result<Arc<dyn CompletionClient>, ConfigError>) -> Self {
        Self {
            store,
            client,
            sessions: SessionStore::default(),
        }
    }

    /// Startup configuration problem to show on every render
    pub fn config_error(&self) -> Option<&ConfigError> {
        self.client.as_ref().err()
    }

    /// Run a patient-store read on the blocking pool
    pub async fn read_store<T, F>(&self, read: F) -> Result<T, DataSourceError>
    where
        F: FnOnce(&PatientStore) -> Result<T, DataSourceError> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || read(&store))
            .await
            .map_err(|e| DataSourceError::Unreadable {
                path: self.store.path().to_path_buf(),
                source: std::io::Error::other(e),
            })?
    }
}

/// Sessions untouched for this long are dropped
pub const SESSION_IDLE_TTL: Duration = Duration::from_secs(2 * 60 * 60);

struct SessionEntry {
    state: SessionState,
    touched: Instant,
}

/// One [`SessionState`] per browser session.
///
/// The lock is held only while an event is applied, never across a
/// completion call. Only accepted events create or keep an entry; a session
/// back at its default state is removed, and idle sessions expire.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<Uuid, SessionEntry>>>,
    idle_ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_ttl(SESSION_IDLE_TTL)
    }
}

impl SessionStore {
    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self {
            inner: Arc::default(),
            idle_ttl,
        }
    }

    /// Current state, or a fresh one for an unknown id
    pub async fn snapshot(&self, id: Uuid) -> SessionState {
        self.inner
            .lock()
            .await
            .get(&id)
            .map(|entry| entry.state.clone())
            .unwrap_or_default()
    }

    /// Apply `event` to the session and store the result.
    ///
    /// On error the stored state is left untouched and returned alongside it.
    pub async fn apply(
        &self,
        id: Uuid,
        event: Event,
    ) -> Result<(SessionState, Effect), (SessionState, SessionError)> {
        let mut sessions = self.inner.lock().await;
        let current = sessions
            .get(&id)
            .map(|entry| entry.state.clone())
            .unwrap_or_default();

        let (next, effect) = current.apply(event).map_err(|e| (current, e))?;

        let ttl = self.idle_ttl;
        sessions.retain(|other, entry| {
            *other == id || entry.state.is_processing() || entry.touched.elapsed() < ttl
        });

        if next == SessionState::default() {
            sessions.remove(&id);
        } else {
            sessions.insert(
                id,
                SessionEntry {
                    state: next.clone(),
                    touched: Instant::now(),
                },
            );
        }
        Ok((next, effect))
    }

    pub async fn count(&self) -> usize {
        self.inner.lock().await.len()
    }
}

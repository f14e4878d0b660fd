//! indogen-server library crate
//!
//! Exposes `build_app` and `config` for integration tests.
//! The actual binary entrypoint is in `main.rs`.

pub mod ai;
pub mod config;
mod error;
mod middleware;
mod routes;
pub mod state;
mod view;

use std::sync::Arc;

use axum::{Extension, Router, middleware as axum_mw, routing::get};
use indogen_core::{CompletionClient, ConfigError, PatientStore};
use tower_http::trace::TraceLayer;

use config::Config;
use state::AppState;

/// Build the full application router, creating the completion client from
/// configuration.
pub fn build_app(config: &Config) -> Router {
    let client = ai::client_from_config(config);
    build_app_with_client(config, client)
}

/// Build the router around an already constructed completion client.
///
/// Extracted so integration tests can substitute a stub backend and drive
/// the app without binding to a TCP port.
pub fn build_app_with_client(
    config: &Config,
    client: Result<Arc<dyn CompletionClient>, ConfigError>,
) -> Router {
    let store = PatientStore::new(config.patient_data_path.clone());
    let state = AppState::new(store, client);

    // Create rate limiter for completion-triggering routes
    let rate_limiter = middleware::create_rate_limiter(config.rate_limit_rps);

    let analysis_routes = routes::analysis_routes()
        .route_layer(axum_mw::from_fn(middleware::rate_limit_middleware))
        .route_layer(Extension(rate_limiter));

    // Install Prometheus metrics recorder.
    // Use build_recorder() + set_global_recorder() so that repeated calls
    // (e.g. in integration tests) don't panic; the second install is
    // silently ignored and we still get a valid handle for /metrics.
    let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
    let prometheus_handle = recorder.handle();
    let _ = metrics::set_global_recorder(recorder);
    metrics::describe_counter!(
        "completion_requests_total",
        "Completion provider calls by outcome"
    );

    let operational_routes = Router::new()
        .route("/health", get(routes::health::check))
        .route("/metrics", get(routes::metrics::get))
        .layer(Extension(prometheus_handle));

    Router::new()
        .merge(routes::dashboard_routes())
        .merge(analysis_routes)
        .merge(operational_routes)
        .with_state(state)
        .layer(axum_mw::from_fn(middleware::audit_middleware))
        .layer(axum_mw::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum_mw::from_fn(middleware::metrics_middleware))
}

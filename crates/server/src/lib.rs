//! triage-server library crate
//!
//! Exposes `build_app`, `config` and `state` for integration tests.
//! The actual binary entrypoint is in `main.rs`.

pub mod accounts;
pub mod config;
pub mod error;
mod middleware;
pub mod routes;
pub mod state;

use axum::{Extension, Router, middleware as axum_mw, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use middleware::ApiKeyAuth;
pub use state::AppState;

/// Build the full application router with all routes and middleware.
///
/// Extracted from `main()` so integration tests can construct the app
/// without binding to a TCP port.
pub fn build_app(state: AppState, config: &Config) -> Router {
    let auth = ApiKeyAuth::new(config.api_key.clone());
    let rate_limiter = middleware::create_rate_limiter(config.rate_limit_rps);

    // Chat and booking (API key when configured, rate limited)
    let triage_routes = routes::triage_routes()
        .layer(axum_mw::from_fn(middleware::auth::auth_middleware))
        .layer(Extension(auth))
        .layer(axum_mw::from_fn(middleware::rate_limit_middleware))
        .layer(Extension(rate_limiter.clone()));

    let account_routes = routes::account_routes()
        .layer(axum_mw::from_fn(middleware::rate_limit_middleware))
        .layer(Extension(rate_limiter));

    let prometheus_handle = prometheus_handle();

    let public_routes = Router::new()
        .route("/health", get(routes::health::check))
        .route("/metrics", get(routes::metrics::render))
        .layer(Extension(prometheus_handle));

    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .merge(public_routes)
        .merge(triage_routes)
        .merge(account_routes)
        .with_state(state)
        .layer(axum_mw::from_fn(middleware::audit_middleware))
        .layer(axum_mw::from_fn(middleware::request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum_mw::from_fn(middleware::metrics_middleware))
}

/// Handle to the process-wide Prometheus recorder, installed on first use.
///
/// Every router built in the same process renders from the one recorder
/// that actually receives the `metrics` macros.
fn prometheus_handle() -> PrometheusHandle {
    static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
    HANDLE
        .get_or_init(|| {
            let recorder = PrometheusBuilder::new().build_recorder();
            let handle = recorder.handle();
            if metrics::set_global_recorder(recorder).is_err() {
                tracing::warn!("A metrics recorder was already installed");
            }
            handle
        })
        .clone()
}

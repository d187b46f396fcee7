// src/lib.rs
// Public library surface for the server binary, the trainer and integration tests.

pub mod api;
pub mod artifacts;
pub mod config;
pub mod decision;
pub mod engine;
pub mod error;
pub mod history;
pub mod metrics;
pub mod model;
pub mod persist;
pub mod resolver;
pub mod telemetry;
pub mod train;

pub use crate::api::{create_router, AppState};
pub use crate::config::ServiceConfig;
pub use crate::decision::{Decision, HistoryEntry, Label};
pub use crate::engine::InferenceService;

use axum::Router;

/// Wire the full application from a resolved config: artifacts (loaded or
/// bootstrapped), history log, routes, and `/metrics` when enabled.
pub fn build_app(cfg: &ServiceConfig) -> anyhow::Result<Router> {
    // Recorder first so startup gauges are captured.
    let handle = if cfg.metrics { Some(metrics::install()?) } else { None };

    let service = InferenceService::from_config(cfg);
    let router = create_router(AppState {
        service,
        static_dir: cfg.static_dir.clone(),
    });
    Ok(match handle {
        Some(h) => router.merge(metrics::router(h)),
        None => router,
    })
}

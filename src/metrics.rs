use axum::{routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::time::Duration;

use crate::decision::Label;
use crate::resolver::ResolutionPath;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder once per process and return its handle.
/// Later calls reuse the first handle.
pub fn install() -> anyhow::Result<PrometheusHandle> {
    HANDLE
        .get_or_try_init(|| {
            PrometheusBuilder::new()
                .install_recorder()
                .map_err(anyhow::Error::from)
        })
        .cloned()
}

/// Router exposing `/metrics` in the Prometheus exposition format.
pub fn router(handle: PrometheusHandle) -> Router {
    Router::new().route(
        "/metrics",
        get(move || {
            let h = handle.clone();
            async move { h.render() }
        }),
    )
}

pub fn record_classification(label: Label, path: ResolutionPath, elapsed: Duration) {
    counter!(
        "spam_classifications_total",
        "label" => if label.is_spam() { "spam" } else { "not_spam" },
        "path" => path.as_str()
    )
    .increment(1);
    histogram!("spam_classify_duration_ms").record(elapsed.as_secs_f64() * 1000.0);
}

pub fn record_invalid_input() {
    counter!("spam_invalid_input_total").increment(1);
}

pub fn record_persist_failure() {
    counter!("spam_history_persist_failures_total").increment(1);
}

pub fn set_artifacts_loaded(loaded: bool) {
    gauge!("spam_artifacts_loaded").set(if loaded { 1.0 } else { 0.0 });
}

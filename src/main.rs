//! SMS Spam Classifier: Binary Entrypoint
//! Boots the Axum HTTP server with the classifier, history log and UI routes.

use shuttle_axum::ShuttleAxum;
use spam_sms_classifier::{build_app, telemetry, ServiceConfig};
use tracing::info;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let cfg = ServiceConfig::load()?;
    info!(
        artifact_dir = %cfg.artifact_dir.display(),
        history = %cfg.history_path.display(),
        auto_train = cfg.auto_train,
        metrics = cfg.metrics,
        "starting spam classifier"
    );

    // Training and file discovery block; keep them off the async workers.
    let router = tokio::task::spawn_blocking(move || build_app(&cfg))
        .await
        .map_err(anyhow::Error::from)??;

    Ok(router.into())
}

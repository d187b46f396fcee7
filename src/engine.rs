//! # Inference Service
//! Per-request orchestration: validate, resolve against the artifact snapshot,
//! record to history, return. Holds only shared handles; cloning is cheap.
//!
//! A history write that degrades is logged and counted but never fails the
//! classification.

use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::artifacts::ArtifactStore;
use crate::config::ServiceConfig;
use crate::decision::{Decision, HistoryEntry};
use crate::error::{ClassifyError, ExportError, HistoryError};
use crate::history::{AppendOutcome, HistoryLog, HistorySnapshot};
use crate::metrics;
use crate::model::Artifacts;
use crate::resolver::resolve_with_path;
use crate::telemetry::anon_hash;
use crate::train::{find_dataset, TrainParams};

#[derive(Debug, Clone)]
pub struct InferenceService {
    artifacts: Option<Arc<Artifacts>>,
    history: Arc<HistoryLog>,
}

impl InferenceService {
    pub fn new(artifacts: Option<Arc<Artifacts>>, history: Arc<HistoryLog>) -> Self {
        Self { artifacts, history }
    }

    /// Startup wiring: discover artifacts, bootstrap from the dataset if
    /// allowed and needed, open the history log.
    pub fn from_config(cfg: &ServiceConfig) -> Self {
        let mut store = ArtifactStore::new(cfg.artifact_search());
        let mut loaded = store.load();

        if !loaded && cfg.auto_train {
            let candidates = cfg.dataset_candidates();
            if let Some(path) = find_dataset(&candidates) {
                info!(dataset = %path.display(), "artifacts not found, training from dataset");
                loaded = store.bootstrap_from(&candidates, &TrainParams::default());
            }
        }
        metrics::set_artifacts_loaded(loaded);

        Self::new(store.artifacts(), Arc::new(HistoryLog::new(&cfg.history_path)))
    }

    pub fn artifacts_loaded(&self) -> bool {
        self.artifacts.is_some()
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Classify `text` and record the decision.
    pub fn classify(&self, text: &str) -> Result<Decision, ClassifyError> {
        if text.is_empty() {
            metrics::record_invalid_input();
            return Err(ClassifyError::InvalidInput);
        }

        let started = Instant::now();
        let (decision, path) = resolve_with_path(text, self.artifacts.as_deref());

        if self.history.append(&HistoryEntry::from(&decision)) == AppendOutcome::Degraded {
            warn!(id = %anon_hash(text), "decision not persisted to history");
            metrics::record_persist_failure();
        }
        metrics::record_classification(decision.label, path, started.elapsed());

        info!(
            id = %anon_hash(text),
            label = %decision.label,
            probability = decision.probability,
            fallback = decision.used_fallback,
            path = path.as_str(),
            "classified"
        );
        Ok(decision)
    }

    pub fn list_history(&self) -> HistorySnapshot {
        self.history.read()
    }

    pub fn clear_history(&self) -> Result<(), HistoryError> {
        self.history.clear()
    }

    pub fn export_history_csv(&self) -> Result<Vec<u8>, ExportError> {
        self.history.export_csv()
    }
}

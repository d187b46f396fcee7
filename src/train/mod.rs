// src/train/mod.rs
//! Bootstrap training: when no artifacts are found at startup, fit a model on
//! the labeled dataset and persist it for the next run.
//!
//! Best effort only. A one-class dataset is repaired with fabricated labels
//! (see `Dataset::ensure_two_classes`), so a bootstrapped model is a way to get
//! the service answering, not a quality guarantee.

pub mod dataset;
pub mod trainer;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::artifacts::{save_pair, ArtifactSearch, ArtifactStore, ALT_MODEL_FILES, ALT_VECTORIZER_FILES};
use crate::error::DatasetError;
use crate::model::{Artifacts, ClassifierFile, TfidfVectorizer};
pub use dataset::{Dataset, Relabel};
pub use trainer::{evaluate, fit, ClassReport, TrainParams};

/// Train from the first existing dataset candidate and persist the result.
/// Returns the artifacts and the paths they were written to (if any write succeeded).
pub fn bootstrap(
    search: &ArtifactSearch,
    dataset_candidates: &[PathBuf],
    params: &TrainParams,
) -> Result<(Artifacts, Option<(PathBuf, PathBuf)>)> {
    let path = find_dataset(dataset_candidates).ok_or(DatasetError::Missing)?;

    let mut ds = Dataset::load(path)?;
    let relabel = ds.ensure_two_classes()?;
    info!(dataset = %path.display(), rows = ds.len(), relabel = ?relabel, "training from dataset");

    let (vectorizer, file) = fit(&ds, params)?;
    let saved = persist(search, &file, &vectorizer);
    Ok((Artifacts::new(vectorizer, file.into_classifier()), saved))
}

// Prefer the alternative names in the primary dir, then the configured primary paths.
fn persist(
    search: &ArtifactSearch,
    file: &ClassifierFile,
    vectorizer: &TfidfVectorizer,
) -> Option<(PathBuf, PathBuf)> {
    let alt = (
        search.primary_dir.join(ALT_MODEL_FILES[0]),
        search.primary_dir.join(ALT_VECTORIZER_FILES[0]),
    );
    let primary = (search.model_path.clone(), search.vectorizer_path.clone());

    for (m, v) in [alt, primary] {
        match save_pair(&m, &v, file, vectorizer).with_context(|| format!("saving to {}", m.display())) {
            Ok(()) => {
                info!(model = %m.display(), vectorizer = %v.display(), "saved trained artifacts");
                return Some((m, v));
            }
            Err(e) => warn!(error = %e, "could not save trained artifacts"),
        }
    }
    None
}

impl ArtifactStore {
    /// Run `bootstrap` and install the result. False on any failure (logged).
    pub fn bootstrap_from(&mut self, dataset_candidates: &[PathBuf], params: &TrainParams) -> bool {
        match bootstrap(self.search(), dataset_candidates, params) {
            Ok((artifacts, saved)) => {
                self.install(artifacts, saved);
                true
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "training error; keyword fallback stays active");
                false
            }
        }
    }
}

/// First dataset candidate that exists.
pub fn find_dataset(candidates: &[PathBuf]) -> Option<&Path> {
    candidates.iter().map(PathBuf::as_path).find(|p| p.exists())
}

//! Artifact discovery and loading.
//!
//! Candidates are tried in a fixed order and the first location where both the
//! classifier and the vectorizer exist and decode wins. A broken candidate is
//! logged and skipped. The store never fails outward: callers get `false` and
//! no artifacts.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::ArtifactError;
use crate::model::{Artifacts, ClassifierFile, TfidfVectorizer};
use crate::persist::write_json_atomic;

pub const PRIMARY_MODEL_FILE: &str = "spam_detector_model.json";
pub const PRIMARY_VECTORIZER_FILE: &str = "tfidf_vectorizer.json";
pub const ALT_MODEL_FILES: [&str; 2] = ["model.json", "spam_detector.json"];
pub const ALT_VECTORIZER_FILES: [&str; 2] = ["vectorizer.json", "tfidf_vectorizer.json"];

/// Where to look for artifacts.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactSearch {
    pub primary_dir: PathBuf,
    pub secondary_dir: PathBuf,
    pub model_path: PathBuf,
    pub vectorizer_path: PathBuf,
}

impl ArtifactSearch {
    /// Primary files inside `dir`, secondary directory = parent of `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            secondary_dir: crate::config::parent_or_dot(&dir),
            model_path: dir.join(PRIMARY_MODEL_FILE),
            vectorizer_path: dir.join(PRIMARY_VECTORIZER_FILE),
            primary_dir: dir,
        }
    }

    /// `(model, vectorizer)` pairs in priority order.
    pub fn candidates(&self) -> Vec<(PathBuf, PathBuf)> {
        let mut out = vec![(self.model_path.clone(), self.vectorizer_path.clone())];
        for dir in [&self.primary_dir, &self.secondary_dir] {
            for m in ALT_MODEL_FILES {
                for v in ALT_VECTORIZER_FILES {
                    out.push((dir.join(m), dir.join(v)));
                }
            }
        }
        out
    }
}

/// Owner of the process-wide artifact snapshot.
#[derive(Debug)]
pub struct ArtifactStore {
    search: ArtifactSearch,
    loaded: Option<Arc<Artifacts>>,
    source: Option<(PathBuf, PathBuf)>,
}

impl ArtifactStore {
    pub fn new(search: ArtifactSearch) -> Self {
        Self {
            search,
            loaded: None,
            source: None,
        }
    }

    pub fn search(&self) -> &ArtifactSearch {
        &self.search
    }

    /// Walk the candidates; true when a pair was loaded.
    pub fn load(&mut self) -> bool {
        for (model_path, vect_path) in self.search.candidates() {
            if !(model_path.exists() && vect_path.exists()) {
                continue;
            }
            match load_pair(&model_path, &vect_path) {
                Ok(art) => {
                    info!(
                        model = %model_path.display(),
                        vectorizer = %vect_path.display(),
                        classifier = art.classifier.kind(),
                        features = art.vectorizer.n_features(),
                        "loaded artifacts"
                    );
                    self.loaded = Some(Arc::new(art));
                    self.source = Some((model_path, vect_path));
                    return true;
                }
                Err(e) => {
                    warn!(error = %e, "error loading artifacts; trying next candidate");
                }
            }
        }
        info!("no usable artifacts found; keyword fallback active");
        false
    }

    /// Install artifacts produced elsewhere (the bootstrap trainer).
    pub fn install(&mut self, artifacts: Artifacts, source: Option<(PathBuf, PathBuf)>) {
        self.loaded = Some(Arc::new(artifacts));
        self.source = source;
    }

    /// Shared read-only snapshot, if any.
    pub fn artifacts(&self) -> Option<Arc<Artifacts>> {
        self.loaded.clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn source(&self) -> Option<&(PathBuf, PathBuf)> {
        self.source.as_ref()
    }
}

pub fn load_pair(model_path: &Path, vect_path: &Path) -> Result<Artifacts, ArtifactError> {
    let classifier = load_classifier(model_path)?;
    let vectorizer = load_vectorizer(vect_path)?;
    // Every vectorizer feature must have a weight in the model.
    if classifier.width() < vectorizer.n_features() {
        return Err(ArtifactError::Invalid {
            path: model_path.display().to_string(),
            reason: format!(
                "model width {} does not cover {} vectorizer features",
                classifier.width(),
                vectorizer.n_features()
            ),
        });
    }
    Ok(Artifacts::new(vectorizer, classifier.into_classifier()))
}

pub fn load_classifier(path: &Path) -> Result<ClassifierFile, ArtifactError> {
    let file: ClassifierFile = read_json(path)?;
    file.validate().map_err(|reason| ArtifactError::Invalid {
        path: path.display().to_string(),
        reason,
    })?;
    Ok(file)
}

pub fn load_vectorizer(path: &Path) -> Result<TfidfVectorizer, ArtifactError> {
    let v: TfidfVectorizer = read_json(path)?;
    v.validate().map_err(|reason| ArtifactError::Invalid {
        path: path.display().to_string(),
        reason,
    })?;
    Ok(v)
}

/// Write both artifacts atomically.
pub fn save_pair(
    model_path: &Path,
    vect_path: &Path,
    classifier: &ClassifierFile,
    vectorizer: &TfidfVectorizer,
) -> std::io::Result<()> {
    write_json_atomic(model_path, classifier)?;
    write_json_atomic(vect_path, vectorizer)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let bytes = fs::read(path).map_err(|source| ArtifactError::Read {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Decode {
        path: path.display().to_string(),
        source,
    })
}

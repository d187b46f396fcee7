// src/config/mod.rs
//! Service configuration: defaults, optional TOML file, environment overrides.
//!
//! Precedence (last wins): built-in defaults, `$SPAM_CONFIG_PATH` or
//! `config/spam.toml`, then the individual `SPAM_*` env vars.
//!
//! ```toml
//! artifact_dir = "backend"
//! history_path = "backend/history.json"
//! auto_train = true
//! metrics = false
//! ```

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::artifacts::{ArtifactSearch, PRIMARY_MODEL_FILE, PRIMARY_VECTORIZER_FILE};

pub const DEFAULT_CONFIG_PATH: &str = "config/spam.toml";
pub const ENV_CONFIG_PATH: &str = "SPAM_CONFIG_PATH";
pub const DATASET_FILE: &str = "SPAM_SMS.csv";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Primary directory searched for artifacts; also where trained artifacts land.
    pub artifact_dir: PathBuf,
    /// Secondary search directory. Defaults to the parent of `artifact_dir`.
    pub secondary_dir: Option<PathBuf>,
    /// Explicit primary model path. Defaults to `artifact_dir/spam_detector_model.json`.
    pub model_path: Option<PathBuf>,
    pub vectorizer_path: Option<PathBuf>,
    pub history_path: PathBuf,
    pub dataset_path: PathBuf,
    /// Directory holding `index.html` and other UI assets.
    pub static_dir: PathBuf,
    /// Train from the dataset at startup when no artifacts are found.
    pub auto_train: bool,
    /// Install the Prometheus recorder and expose `/metrics`.
    pub metrics: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("backend"),
            secondary_dir: None,
            model_path: None,
            vectorizer_path: None,
            history_path: PathBuf::from("backend/history.json"),
            dataset_path: PathBuf::from("backend").join(DATASET_FILE),
            static_dir: PathBuf::from("."),
            auto_train: true,
            metrics: false,
        }
    }
}

impl ServiceConfig {
    /// Load from file (if any) and apply process env overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => {
                let path = PathBuf::from(p);
                if !path.exists() {
                    return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path {}", path.display()));
                }
                Self::from_path(&path)?
            }
            Err(_) => {
                let path = PathBuf::from(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    Self::from_path(&path)?
                } else {
                    Self::default()
                }
            }
        };
        cfg.apply_overrides(|k| std::env::var(k).ok());
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading service config from {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Apply `SPAM_*` overrides read through `get` (the process env in `load`).
    pub fn apply_overrides<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = |k: &str| get(k).filter(|v| !v.trim().is_empty()).map(PathBuf::from);

        if let Some(p) = path("SPAM_ARTIFACT_DIR") {
            self.artifact_dir = p;
        }
        if let Some(p) = path("SPAM_SECONDARY_DIR") {
            self.secondary_dir = Some(p);
        }
        if let Some(p) = path("SPAM_MODEL_PATH") {
            self.model_path = Some(p);
        }
        if let Some(p) = path("SPAM_VECTORIZER_PATH") {
            self.vectorizer_path = Some(p);
        }
        if let Some(p) = path("SPAM_HISTORY_PATH") {
            self.history_path = p;
        }
        if let Some(p) = path("SPAM_DATASET_PATH") {
            self.dataset_path = p;
        }
        if let Some(p) = path("SPAM_STATIC_DIR") {
            self.static_dir = p;
        }
        if let Some(b) = get("SPAM_AUTO_TRAIN").and_then(|v| parse_flag("SPAM_AUTO_TRAIN", &v)) {
            self.auto_train = b;
        }
        if let Some(b) = get("SPAM_METRICS").and_then(|v| parse_flag("SPAM_METRICS", &v)) {
            self.metrics = b;
        }
    }

    pub fn secondary_dir(&self) -> PathBuf {
        self.secondary_dir.clone().unwrap_or_else(|| parent_or_dot(&self.artifact_dir))
    }

    pub fn artifact_search(&self) -> ArtifactSearch {
        ArtifactSearch {
            primary_dir: self.artifact_dir.clone(),
            secondary_dir: self.secondary_dir(),
            model_path: self
                .model_path
                .clone()
                .unwrap_or_else(|| self.artifact_dir.join(PRIMARY_MODEL_FILE)),
            vectorizer_path: self
                .vectorizer_path
                .clone()
                .unwrap_or_else(|| self.artifact_dir.join(PRIMARY_VECTORIZER_FILE)),
        }
    }

    /// Dataset locations tried by the bootstrap trainer, in order.
    pub fn dataset_candidates(&self) -> Vec<PathBuf> {
        let mut out = vec![self.dataset_path.clone()];
        let alt = self.secondary_dir().join(DATASET_FILE);
        if alt != self.dataset_path {
            out.push(alt);
        }
        out
    }
}

pub(crate) fn parent_or_dot(p: &Path) -> PathBuf {
    match p.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn parse_flag(name: &str, raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        other => {
            warn!(var = name, value = other, "ignoring unrecognized boolean env value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_point_into_backend() {
        let cfg = ServiceConfig::default();
        let s = cfg.artifact_search();
        assert_eq!(s.model_path, PathBuf::from("backend/spam_detector_model.json"));
        assert_eq!(s.vectorizer_path, PathBuf::from("backend/tfidf_vectorizer.json"));
        assert_eq!(s.secondary_dir, PathBuf::from("."));
        assert_eq!(
            cfg.dataset_candidates(),
            vec![PathBuf::from("backend/SPAM_SMS.csv"), PathBuf::from("./SPAM_SMS.csv")]
        );
    }

    #[test]
    fn toml_then_env_overrides() {
        let mut cfg = ServiceConfig::from_toml_str(
            r#"
            artifact_dir = "models/current"
            metrics = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.secondary_dir(), PathBuf::from("models"));
        assert!(cfg.metrics);
        assert!(cfg.auto_train, "unset keys keep defaults");

        let env: HashMap<&str, &str> = HashMap::from([
            ("SPAM_HISTORY_PATH", "/tmp/h.json"),
            ("SPAM_AUTO_TRAIN", "0"),
            ("SPAM_METRICS", "maybe"),
        ]);
        cfg.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.history_path, PathBuf::from("/tmp/h.json"));
        assert!(!cfg.auto_train);
        assert!(cfg.metrics, "unrecognized flag leaves value unchanged");
    }

    #[test]
    fn unknown_toml_type_is_an_error() {
        assert!(ServiceConfig::from_toml_str("auto_train = \"sometimes\"").is_err());
    }
}

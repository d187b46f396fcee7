//! Trained artifacts: a TF-IDF vectorizer plus a classifier.
//!
//! A classifier is one of two capabilities. `Probabilistic` models expose a
//! per-class probability vector (and a bare prediction); `LabelOnly` models can
//! only name a class. The resolver dispatches on the variant.
//!
//! On disk both artifacts are JSON. The classifier file is tagged by `kind`:
//!
//! ```json
//! { "kind": "logistic_regression", "classes": [false, true],
//!   "coef": [[0.3, -1.2]], "intercept": [-0.1] }
//! ```

pub mod linear;
pub mod naive_bayes;
pub mod text;
pub mod vectorizer;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::ClassifierFailure;
pub use linear::{LinearModel, LinearSvc, LogisticRegression};
pub use naive_bayes::MultinomialNb;
pub use vectorizer::TfidfVectorizer;

/// Sorted `(feature index, value)` pairs.
pub type SparseVector = Vec<(usize, f64)>;

/// A class label as stored by the training tool: text, integer or boolean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassLabel {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ClassLabel {
    /// Case-insensitive "spam".
    pub fn is_spam_name(&self) -> bool {
        matches!(self, ClassLabel::Text(s) if s.trim().eq_ignore_ascii_case("spam"))
    }

    /// Numerically equal to 1 (`true` counts).
    pub fn is_one(&self) -> bool {
        match self {
            ClassLabel::Bool(b) => *b,
            ClassLabel::Int(i) => *i == 1,
            ClassLabel::Float(f) => *f == 1.0,
            ClassLabel::Text(_) => false,
        }
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassLabel::Bool(b) => write!(f, "{b}"),
            ClassLabel::Int(i) => write!(f, "{i}"),
            ClassLabel::Float(x) => write!(f, "{x}"),
            ClassLabel::Text(s) => f.write_str(s),
        }
    }
}

/// Classifier exposing per-class probabilities.
pub trait ProbabilisticClassifier: Send + Sync + fmt::Debug {
    fn classes(&self) -> &[ClassLabel];
    fn predict_proba(&self, x: &SparseVector) -> Result<Vec<f64>, ClassifierFailure>;
    fn predict(&self, x: &SparseVector) -> Result<ClassLabel, ClassifierFailure>;
}

/// Classifier that can only name a class.
pub trait LabelOnlyClassifier: Send + Sync + fmt::Debug {
    fn predict(&self, x: &SparseVector) -> Result<ClassLabel, ClassifierFailure>;
}

#[derive(Debug, Clone)]
pub enum Classifier {
    Probabilistic(Arc<dyn ProbabilisticClassifier>),
    LabelOnly(Arc<dyn LabelOnlyClassifier>),
}

impl Classifier {
    pub fn kind(&self) -> &'static str {
        match self {
            Classifier::Probabilistic(_) => "probabilistic",
            Classifier::LabelOnly(_) => "label_only",
        }
    }
}

/// Classifier artifact as serialized on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierFile {
    LogisticRegression(LinearModel),
    MultinomialNb(MultinomialNb),
    LinearSvc(LinearModel),
}

impl ClassifierFile {
    pub fn validate(&self) -> Result<(), String> {
        match self {
            ClassifierFile::LogisticRegression(m) | ClassifierFile::LinearSvc(m) => m.validate(),
            ClassifierFile::MultinomialNb(m) => m.validate(),
        }
    }

    /// Number of input features the model has weights for.
    pub fn width(&self) -> usize {
        match self {
            ClassifierFile::LogisticRegression(m) | ClassifierFile::LinearSvc(m) => m.width(),
            ClassifierFile::MultinomialNb(m) => m.feature_log_prob.first().map(Vec::len).unwrap_or(0),
        }
    }

    pub fn into_classifier(self) -> Classifier {
        match self {
            ClassifierFile::LogisticRegression(m) => {
                Classifier::Probabilistic(Arc::new(LogisticRegression(m)))
            }
            ClassifierFile::MultinomialNb(m) => Classifier::Probabilistic(Arc::new(m)),
            ClassifierFile::LinearSvc(m) => Classifier::LabelOnly(Arc::new(LinearSvc(m))),
        }
    }
}

/// Immutable artifact pair shared read-only by every request.
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub vectorizer: TfidfVectorizer,
    pub classifier: Classifier,
}

impl Artifacts {
    pub fn new(vectorizer: TfidfVectorizer, classifier: Classifier) -> Self {
        Self {
            vectorizer,
            classifier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn class_labels_decode_from_mixed_json() {
        let v: Vec<ClassLabel> = serde_json::from_value(json!([false, 1, "spam", 1.0])).unwrap();
        assert_eq!(v[0], ClassLabel::Bool(false));
        assert!(v[1].is_one());
        assert!(v[2].is_spam_name());
        assert!(v[3].is_one());
        assert!(!ClassLabel::Text("1".into()).is_one());
    }

    #[test]
    fn classifier_file_is_tagged_by_kind() {
        let raw = json!({
            "kind": "linear_svc",
            "classes": ["ham", "spam"],
            "coef": [[1.0]],
            "intercept": [0.0]
        });
        let f: ClassifierFile = serde_json::from_value(raw).unwrap();
        assert!(f.validate().is_ok());
        assert_eq!(f.into_classifier().kind(), "label_only");
    }
}

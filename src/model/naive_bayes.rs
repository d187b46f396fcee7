//! Multinomial naive Bayes over TF-IDF features.

use serde::{Deserialize, Serialize};

use super::linear::{argmax, softmax};
use super::{ClassLabel, ProbabilisticClassifier, SparseVector};
use crate::error::ClassifierFailure;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultinomialNb {
    pub classes: Vec<ClassLabel>,
    pub class_log_prior: Vec<f64>,
    /// One row of log P(feature | class) per class.
    pub feature_log_prob: Vec<Vec<f64>>,
}

impl MultinomialNb {
    pub fn validate(&self) -> Result<(), String> {
        let k = self.classes.len();
        if k < 2 {
            return Err(format!("need at least 2 classes, got {k}"));
        }
        if self.class_log_prior.len() != k || self.feature_log_prob.len() != k {
            return Err(format!(
                "{} priors and {} likelihood rows for {k} classes",
                self.class_log_prior.len(),
                self.feature_log_prob.len()
            ));
        }
        let width = self.feature_log_prob[0].len();
        if self.feature_log_prob.iter().any(|r| r.len() != width) {
            return Err("ragged likelihood matrix".into());
        }
        Ok(())
    }

    fn joint_log_likelihood(&self, x: &SparseVector) -> Result<Vec<f64>, ClassifierFailure> {
        let width = self.feature_log_prob.first().map(Vec::len).unwrap_or(0);
        let mut jll = Vec::with_capacity(self.classes.len());
        for (prior, row) in self.class_log_prior.iter().zip(&self.feature_log_prob) {
            let mut s = *prior;
            for &(j, v) in x {
                let w = row.get(j).ok_or(ClassifierFailure::DimensionMismatch { index: j, width })?;
                s += w * v;
            }
            if !s.is_finite() {
                return Err(ClassifierFailure::NonFinite);
            }
            jll.push(s);
        }
        Ok(jll)
    }
}

impl ProbabilisticClassifier for MultinomialNb {
    fn classes(&self) -> &[ClassLabel] {
        &self.classes
    }

    fn predict_proba(&self, x: &SparseVector) -> Result<Vec<f64>, ClassifierFailure> {
        Ok(softmax(&self.joint_log_likelihood(x)?))
    }

    fn predict(&self, x: &SparseVector) -> Result<ClassLabel, ClassifierFailure> {
        let jll = self.joint_log_likelihood(x)?;
        self.classes
            .get(argmax(&jll))
            .cloned()
            .ok_or(ClassifierFailure::ShapeMismatch {
                classes: self.classes.len(),
                outputs: jll.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> MultinomialNb {
        MultinomialNb {
            classes: vec![ClassLabel::Text("ham".into()), ClassLabel::Text("spam".into())],
            class_log_prior: vec![(0.8f64).ln(), (0.2f64).ln()],
            feature_log_prob: vec![vec![(0.9f64).ln(), (0.1f64).ln()], vec![(0.1f64).ln(), (0.9f64).ln()]],
        }
    }

    #[test]
    fn spam_feature_tips_posterior() {
        let nb = model();
        let p = nb.predict_proba(&vec![(1, 3.0)]).unwrap();
        assert!(p[1] > 0.5, "posterior {p:?}");
        assert_eq!(nb.predict(&vec![(1, 3.0)]).unwrap(), ClassLabel::Text("spam".into()));
    }

    #[test]
    fn empty_row_falls_back_to_prior() {
        let p = model().predict_proba(&vec![]).unwrap();
        assert!((p[0] - 0.8).abs() < 1e-9);
    }

    #[test]
    fn mismatched_priors_are_invalid() {
        let mut nb = model();
        nb.class_log_prior.pop();
        assert!(nb.validate().is_err());
    }
}

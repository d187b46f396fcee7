//! Linear models: logistic regression (probabilistic) and linear SVC (label only).
//!
//! Binary models carry one coefficient row; the positive side of the decision
//! function maps to `classes[1]`. Multiclass models carry one row per class.

use serde::{Deserialize, Serialize};

use super::{ClassLabel, LabelOnlyClassifier, ProbabilisticClassifier, SparseVector};
use crate::error::ClassifierFailure;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub classes: Vec<ClassLabel>,
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

impl LinearModel {
    pub fn validate(&self) -> Result<(), String> {
        if self.classes.len() < 2 {
            return Err(format!("need at least 2 classes, got {}", self.classes.len()));
        }
        if self.coef.is_empty() {
            return Err("empty coefficient matrix".into());
        }
        let width = self.coef[0].len();
        if self.coef.iter().any(|r| r.len() != width) {
            return Err("ragged coefficient matrix".into());
        }
        if self.intercept.len() != self.coef.len() {
            return Err(format!(
                "{} intercepts for {} coefficient rows",
                self.intercept.len(),
                self.coef.len()
            ));
        }
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.coef.first().map(Vec::len).unwrap_or(0)
    }

    /// One raw score per coefficient row.
    pub fn decision_function(&self, x: &SparseVector) -> Result<Vec<f64>, ClassifierFailure> {
        let width = self.width();
        let mut scores = Vec::with_capacity(self.coef.len());
        for (row, b) in self.coef.iter().zip(&self.intercept) {
            let mut s = *b;
            for &(j, v) in x {
                let w = row.get(j).ok_or(ClassifierFailure::DimensionMismatch { index: j, width })?;
                s += w * v;
            }
            if !s.is_finite() {
                return Err(ClassifierFailure::NonFinite);
            }
            scores.push(s);
        }
        Ok(scores)
    }

    fn label_for(&self, scores: &[f64]) -> Result<ClassLabel, ClassifierFailure> {
        let idx = if scores.len() == 1 {
            usize::from(scores[0] > 0.0)
        } else {
            argmax(scores)
        };
        self.classes
            .get(idx)
            .cloned()
            .ok_or(ClassifierFailure::ShapeMismatch {
                classes: self.classes.len(),
                outputs: scores.len(),
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegression(pub LinearModel);

impl ProbabilisticClassifier for LogisticRegression {
    fn classes(&self) -> &[ClassLabel] {
        &self.0.classes
    }

    fn predict_proba(&self, x: &SparseVector) -> Result<Vec<f64>, ClassifierFailure> {
        let scores = self.0.decision_function(x)?;
        let probs = if scores.len() == 1 {
            let p = sigmoid(scores[0]);
            vec![1.0 - p, p]
        } else {
            softmax(&scores)
        };
        if probs.len() != self.0.classes.len() {
            return Err(ClassifierFailure::ShapeMismatch {
                classes: self.0.classes.len(),
                outputs: probs.len(),
            });
        }
        Ok(probs)
    }

    fn predict(&self, x: &SparseVector) -> Result<ClassLabel, ClassifierFailure> {
        let scores = self.0.decision_function(x)?;
        self.0.label_for(&scores)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearSvc(pub LinearModel);

impl LabelOnlyClassifier for LinearSvc {
    fn predict(&self, x: &SparseVector) -> Result<ClassLabel, ClassifierFailure> {
        let scores = self.0.decision_function(x)?;
        self.0.label_for(&scores)
    }
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Numerically stable softmax.
pub(crate) fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

pub(crate) fn argmax(v: &[f64]) -> usize {
    let mut best = 0;
    for (i, x) in v.iter().enumerate() {
        if *x > v[best] {
            best = i;
        }
    }
    best
}

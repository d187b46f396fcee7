//! TF-IDF + logistic regression fit and a small holdout report.
//!
//! Full-batch gradient descent from zero weights, so the same corpus always
//! yields the same model.

use serde::Serialize;

use super::dataset::Dataset;
use crate::error::DatasetError;
use crate::model::linear::sigmoid;
use crate::model::text::english_stop_words;
use crate::model::vectorizer::FitParams;
use crate::model::{
    ClassLabel, ClassifierFile, LinearModel, LogisticRegression, ProbabilisticClassifier, SparseVector,
    TfidfVectorizer,
};
use crate::resolver::spam_index;

#[derive(Debug, Clone)]
pub struct TrainParams {
    pub max_features: usize,
    pub ngram_range: (usize, usize),
    /// Inverse L2 regularization strength.
    pub c: f64,
    pub max_iter: usize,
    pub tol: f64,
    pub learning_rate: f64,
}

impl Default for TrainParams {
    fn default() -> Self {
        Self {
            max_features: 20_000,
            ngram_range: (1, 1),
            c: 1.0,
            max_iter: 1000,
            tol: 1e-6,
            learning_rate: 1.0,
        }
    }
}

/// Fit both artifacts on `ds`. Labels must already hold two classes.
///
/// Fails with `NoFeatures` when every token is a stop word or too short.
pub fn fit(ds: &Dataset, params: &TrainParams) -> Result<(TfidfVectorizer, ClassifierFile), DatasetError> {
    let vectorizer = TfidfVectorizer::fit(
        &ds.texts,
        &FitParams {
            max_features: params.max_features,
            stop_words: english_stop_words(),
            ngram_range: params.ngram_range,
        },
    );
    if vectorizer.n_features() == 0 {
        return Err(DatasetError::NoFeatures);
    }
    let rows: Vec<SparseVector> = ds.texts.iter().map(|t| vectorizer.transform(t)).collect();
    let model = fit_logistic(&rows, &ds.labels, vectorizer.n_features(), params);
    Ok((vectorizer, ClassifierFile::LogisticRegression(model)))
}

/// Binary logistic regression with classes `[false, true]`.
pub fn fit_logistic(rows: &[SparseVector], labels: &[bool], n_features: usize, params: &TrainParams) -> LinearModel {
    let n = rows.len().max(1) as f64;
    let l2 = 1.0 / (params.c.max(f64::EPSILON) * n);
    let mut w = vec![0.0; n_features];
    let mut b = 0.0;
    let mut grad_w = vec![0.0; n_features];

    for _ in 0..params.max_iter {
        grad_w.iter_mut().for_each(|g| *g = 0.0);
        let mut grad_b = 0.0;

        for (x, &y) in rows.iter().zip(labels) {
            let z = b + x.iter().map(|&(j, v)| w[j] * v).sum::<f64>();
            let err = sigmoid(z) - if y { 1.0 } else { 0.0 };
            for &(j, v) in x {
                grad_w[j] += err * v;
            }
            grad_b += err;
        }

        let mut max_grad = (grad_b / n).abs();
        for (g, wj) in grad_w.iter_mut().zip(&w) {
            *g = *g / n + l2 * wj;
            max_grad = max_grad.max(g.abs());
        }
        if max_grad < params.tol {
            break;
        }
        for (wj, g) in w.iter_mut().zip(&grad_w) {
            *wj -= params.learning_rate * g;
        }
        b -= params.learning_rate * grad_b / n;
    }

    LinearModel {
        classes: vec![ClassLabel::Bool(false), ClassLabel::Bool(true)],
        coef: vec![w],
        intercept: vec![b],
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClassReport {
    pub class: &'static str,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class precision/recall/F1 of a logistic model on `ds`, ham first.
pub fn evaluate(vectorizer: &TfidfVectorizer, model: &LinearModel, ds: &Dataset) -> Vec<ClassReport> {
    let lr = LogisticRegression(model.clone());
    let preds: Vec<bool> = ds
        .texts
        .iter()
        .map(|t| {
            let x = vectorizer.transform(t);
            lr.predict_proba(&x)
                .ok()
                .and_then(|p| p.get(spam_index(lr.classes(), p.len())).copied())
                .map(|p| p >= 0.5)
                .unwrap_or(false)
        })
        .collect();

    [("ham", false), ("spam", true)]
        .into_iter()
        .map(|(name, class)| {
            let tp = count(&preds, &ds.labels, |p, y| p == class && y == class);
            let fp = count(&preds, &ds.labels, |p, y| p == class && y != class);
            let fn_ = count(&preds, &ds.labels, |p, y| p != class && y == class);
            let precision = ratio(tp, tp + fp);
            let recall = ratio(tp, tp + fn_);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            ClassReport {
                class: name,
                precision,
                recall,
                f1,
                support: tp + fn_,
            }
        })
        .collect()
}

fn count(preds: &[bool], labels: &[bool], f: impl Fn(bool, bool) -> bool) -> usize {
    preds.iter().zip(labels).filter(|(p, y)| f(**p, **y)).count()
}

fn ratio(a: usize, b: usize) -> f64 {
    if b == 0 {
        0.0
    } else {
        a as f64 / b as f64
    }
}

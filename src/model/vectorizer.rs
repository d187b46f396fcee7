//! TF-IDF text vectorizer: JSON artifact shape, transform and fit.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::text::{terms, tokenize};
use super::SparseVector;

fn default_true() -> bool {
    true
}
fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    #[default]
    L2,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    /// term -> feature index
    pub vocabulary: BTreeMap<String, usize>,
    pub idf: Vec<f64>,
    #[serde(default = "default_true")]
    pub lowercase: bool,
    #[serde(default)]
    pub stop_words: BTreeSet<String>,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default)]
    pub sublinear_tf: bool,
    #[serde(default)]
    pub norm: Norm,
}

/// Fit parameters for `TfidfVectorizer::fit`.
#[derive(Debug, Clone)]
pub struct FitParams {
    pub max_features: usize,
    pub stop_words: BTreeSet<String>,
    pub ngram_range: (usize, usize),
}

impl TfidfVectorizer {
    pub fn n_features(&self) -> usize {
        self.idf.len()
    }

    /// Structural checks run once at load time.
    pub fn validate(&self) -> Result<(), String> {
        if self.idf.is_empty() {
            return Err("vectorizer has an empty idf table".into());
        }
        if let Some((term, idx)) = self.vocabulary.iter().find(|(_, i)| **i >= self.idf.len()) {
            return Err(format!(
                "term '{term}' maps to index {idx} beyond idf length {}",
                self.idf.len()
            ));
        }
        if self.idf.iter().any(|v| !v.is_finite()) {
            return Err("idf contains non-finite values".into());
        }
        Ok(())
    }

    /// Map text to a sorted sparse TF-IDF row. Unknown terms are ignored.
    pub fn transform(&self, text: &str) -> SparseVector {
        let tokens = tokenize(text, self.lowercase);
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for term in terms(&tokens, &self.stop_words, self.ngram_range.0, self.ngram_range.1) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut row: SparseVector = counts
            .into_iter()
            .map(|(idx, tf)| {
                let tf = if self.sublinear_tf { 1.0 + tf.ln() } else { tf };
                let idf = self.idf.get(idx).copied().unwrap_or(1.0);
                (idx, tf * idf)
            })
            .collect();

        if self.norm == Norm::L2 {
            let norm = row.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                for (_, v) in row.iter_mut() {
                    *v /= norm;
                }
            }
        }
        row
    }

    /// Learn vocabulary and smoothed idf from `docs`.
    ///
    /// Terms are ranked by total corpus frequency (ties broken lexically), the
    /// top `max_features` kept, and indices assigned in lexical order.
    pub fn fit(docs: &[String], params: &FitParams) -> Self {
        let (min_n, max_n) = params.ngram_range;
        let mut corpus_freq: HashMap<String, u64> = HashMap::new();
        let mut doc_terms: Vec<BTreeSet<String>> = Vec::with_capacity(docs.len());

        for doc in docs {
            let toks = tokenize(doc, true);
            let ts = terms(&toks, &params.stop_words, min_n, max_n);
            let mut seen = BTreeSet::new();
            for t in ts {
                *corpus_freq.entry(t.clone()).or_insert(0) += 1;
                seen.insert(t);
            }
            doc_terms.push(seen);
        }

        let mut ranked: Vec<(String, u64)> = corpus_freq.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(params.max_features.max(1));

        let kept: BTreeSet<String> = ranked.into_iter().map(|(t, _)| t).collect();
        let vocabulary: BTreeMap<String, usize> = kept
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();

        let mut df = vec![0u64; vocabulary.len()];
        for seen in &doc_terms {
            for t in seen {
                if let Some(&idx) = vocabulary.get(t) {
                    df[idx] += 1;
                }
            }
        }

        let n = docs.len() as f64;
        let idf = df
            .iter()
            .map(|&d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0)
            .collect();

        Self {
            vocabulary,
            idf,
            lowercase: true,
            stop_words: params.stop_words.clone(),
            ngram_range: params.ngram_range,
            sublinear_tf: false,
            norm: Norm::L2,
        }
    }
}

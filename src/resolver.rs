//! Label resolution ladder.
//!
//! Order, first applicable wins:
//! 1. no artifacts: keyword heuristic (0.9 / 0.05), `used_fallback = true`
//! 2. probabilistic classifier: probability of the spam class, Spam iff >= 0.5
//! 3. probabilities unavailable or failing: bare prediction, probability fixed at 1.0
//!
//! A failing bare prediction drops back to step 1. Nothing here returns an error.

use tracing::{debug, warn};

use crate::decision::{Decision, Label};
use crate::error::ClassifierFailure;
use crate::model::{Artifacts, ClassLabel, Classifier, ProbabilisticClassifier, SparseVector};
use crate::telemetry::anon_hash;

/// Terms that mark a message as spam when no model is loaded. Matched as
/// substrings of the lower-cased text.
pub const FALLBACK_KEYWORDS: &[&str] = &[
    "win",
    "free",
    "prize",
    "cash",
    "reward",
    "claim",
    "promo",
    "congratulations",
    "loan",
    "click",
    "won",
    "urgent",
    "voucher",
    "congrats",
];

pub const FALLBACK_SPAM_PROBABILITY: f64 = 0.9;
pub const FALLBACK_HAM_PROBABILITY: f64 = 0.05;
/// Reported when only a class name is known. A convention, not a confidence.
pub const BARE_PREDICTION_PROBABILITY: f64 = 1.0;

/// Which rung of the ladder produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionPath {
    Keyword,
    Model,
    BarePrediction,
}

impl ResolutionPath {
    pub fn as_str(self) -> &'static str {
        match self {
            ResolutionPath::Keyword => "keyword",
            ResolutionPath::Model => "model",
            ResolutionPath::BarePrediction => "bare_prediction",
        }
    }
}

pub fn keyword_match(text: &str) -> bool {
    let lower = text.to_lowercase();
    FALLBACK_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Resolve `text` (non-empty, validated by the caller) to a decision.
pub fn resolve(text: &str, artifacts: Option<&Artifacts>) -> Decision {
    resolve_with_path(text, artifacts).0
}

pub fn resolve_with_path(text: &str, artifacts: Option<&Artifacts>) -> (Decision, ResolutionPath) {
    let Some(art) = artifacts else {
        return (keyword_decision(text), ResolutionPath::Keyword);
    };

    let x = art.vectorizer.transform(text);
    let (label, probability, path) = match &art.classifier {
        Classifier::Probabilistic(model) => match spam_probability(model.as_ref(), &x) {
            Ok(p) => (Label::from_probability(p), p, ResolutionPath::Model),
            Err(e) => {
                warn!(id = %anon_hash(text), error = %e, "predict_proba failed; using bare prediction");
                match bare_label(model.predict(&x)) {
                    Some(l) => (l, BARE_PREDICTION_PROBABILITY, ResolutionPath::BarePrediction),
                    None => return degrade(text),
                }
            }
        },
        Classifier::LabelOnly(model) => match bare_label(model.predict(&x)) {
            Some(l) => (l, BARE_PREDICTION_PROBABILITY, ResolutionPath::BarePrediction),
            None => return degrade(text),
        },
    };

    debug!(
        id = %anon_hash(text),
        label = %label,
        probability,
        path = path.as_str(),
        "resolved"
    );
    (Decision::new(text, label, probability, false), path)
}

/// Index of the spam class among `classes`: a "spam" name first, then a class
/// equal to 1, else the last probability slot.
pub fn spam_index(classes: &[ClassLabel], n_probs: usize) -> usize {
    classes
        .iter()
        .position(ClassLabel::is_spam_name)
        .or_else(|| classes.iter().position(ClassLabel::is_one))
        .unwrap_or_else(|| n_probs.saturating_sub(1))
}

fn spam_probability(
    model: &dyn ProbabilisticClassifier,
    x: &SparseVector,
) -> Result<f64, ClassifierFailure> {
    let probs = model.predict_proba(x)?;
    let idx = spam_index(model.classes(), probs.len());
    let p = *probs.get(idx).ok_or(ClassifierFailure::SpamIndexOutOfRange {
        index: idx,
        len: probs.len(),
    })?;
    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
        return Err(ClassifierFailure::NonFinite);
    }
    Ok(p)
}

fn bare_label(pred: Result<ClassLabel, ClassifierFailure>) -> Option<Label> {
    match pred {
        Ok(c) => Some(Label::from_flag(c.is_spam_name() || c.is_one())),
        Err(e) => {
            warn!(error = %e, "bare prediction failed");
            None
        }
    }
}

fn keyword_decision(text: &str) -> Decision {
    let is_spam = keyword_match(text);
    let p = if is_spam {
        FALLBACK_SPAM_PROBABILITY
    } else {
        FALLBACK_HAM_PROBABILITY
    };
    Decision::new(text, Label::from_flag(is_spam), p, true)
}

fn degrade(text: &str) -> (Decision, ResolutionPath) {
    warn!(id = %anon_hash(text), "classifier unusable for this input; keyword fallback");
    (keyword_decision(text), ResolutionPath::Keyword)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_fallback_scenarios() {
        let d = resolve("You have WON a FREE prize, claim now!", None);
        assert_eq!(d.label, Label::Spam);
        assert_eq!(d.probability, 0.9);
        assert!(d.used_fallback);

        let d = resolve("Can you send the report by tomorrow?", None);
        assert_eq!(d.label, Label::NotSpam);
        assert_eq!(d.probability, 0.05);
        assert!(d.used_fallback);
    }

    #[test]
    fn keywords_match_inside_words() {
        // substring semantics: "window" contains "win"
        assert!(keyword_match("Close the WINDOW please"));
        assert!(!keyword_match("lunch at noon"));
    }

    #[test]
    fn spam_index_prefers_name_then_one_then_last() {
        let named = vec![ClassLabel::Text("SPAM".into()), ClassLabel::Text("ham".into())];
        assert_eq!(spam_index(&named, 2), 0);

        let numeric = vec![ClassLabel::Int(1), ClassLabel::Int(0)];
        assert_eq!(spam_index(&numeric, 2), 0);

        let flags = vec![ClassLabel::Bool(false), ClassLabel::Bool(true)];
        assert_eq!(spam_index(&flags, 2), 1);

        let other = vec![ClassLabel::Text("a".into()), ClassLabel::Text("b".into())];
        assert_eq!(spam_index(&other, 2), 1);
        assert_eq!(spam_index(&[], 0), 0);
    }
}

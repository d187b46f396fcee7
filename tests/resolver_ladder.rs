// tests/resolver_ladder.rs
//
// Every rung of the resolution ladder, driven by stub classifiers so each
// failure mode can be forced.

use std::collections::BTreeSet;
use std::sync::Arc;

use spam_sms_classifier::decision::Label;
use spam_sms_classifier::error::ClassifierFailure;
use spam_sms_classifier::model::vectorizer::FitParams;
use spam_sms_classifier::model::{
    Artifacts, ClassLabel, Classifier, LabelOnlyClassifier, ProbabilisticClassifier, SparseVector,
    TfidfVectorizer,
};
use spam_sms_classifier::resolver::{resolve, resolve_with_path, spam_index, ResolutionPath};

#[derive(Debug)]
struct ProbaStub {
    classes: Vec<ClassLabel>,
    proba: Result<Vec<f64>, ClassifierFailure>,
    label: Result<ClassLabel, ClassifierFailure>,
}

impl ProbabilisticClassifier for ProbaStub {
    fn classes(&self) -> &[ClassLabel] {
        &self.classes
    }
    fn predict_proba(&self, _x: &SparseVector) -> Result<Vec<f64>, ClassifierFailure> {
        self.proba.clone()
    }
    fn predict(&self, _x: &SparseVector) -> Result<ClassLabel, ClassifierFailure> {
        self.label.clone()
    }
}

#[derive(Debug)]
struct LabelStub(Result<ClassLabel, ClassifierFailure>);

impl LabelOnlyClassifier for LabelStub {
    fn predict(&self, _x: &SparseVector) -> Result<ClassLabel, ClassifierFailure> {
        self.0.clone()
    }
}

fn vectorizer() -> TfidfVectorizer {
    let docs = vec!["free prize inside".to_string(), "lunch at noon".to_string()];
    TfidfVectorizer::fit(
        &docs,
        &FitParams {
            max_features: 100,
            stop_words: BTreeSet::new(),
            ngram_range: (1, 1),
        },
    )
}

fn text(s: &str) -> ClassLabel {
    ClassLabel::Text(s.to_string())
}

fn proba(classes: Vec<ClassLabel>, probs: Vec<f64>) -> Artifacts {
    Artifacts::new(
        vectorizer(),
        Classifier::Probabilistic(Arc::new(ProbaStub {
            classes,
            proba: Ok(probs),
            label: Ok(text("ham")),
        })),
    )
}

#[test]
fn no_artifacts_uses_keywords() {
    let (d, path) = resolve_with_path("Claim your PRIZE today", None);
    assert_eq!(path, ResolutionPath::Keyword);
    assert_eq!(d.label, Label::Spam);
    assert_eq!(d.probability, 0.9);
    assert!(d.used_fallback);

    let d = resolve("Meeting moved to 3pm", None);
    assert_eq!(d.label, Label::NotSpam);
    assert_eq!(d.probability, 0.05);
    assert!(d.used_fallback);
}

#[test]
fn keywords_match_inside_words() {
    // "window" contains "win"
    assert_eq!(resolve("Close the window please", None).label, Label::Spam);
}

#[test]
fn spam_named_class_is_preferred() {
    let art = proba(vec![text("spam"), text("ham")], vec![0.8, 0.2]);
    let (d, path) = resolve_with_path("anything", Some(&art));
    assert_eq!(path, ResolutionPath::Model);
    assert_eq!(d.label, Label::Spam);
    assert_eq!(d.probability, 0.8);
    assert!(!d.used_fallback);
}

#[test]
fn numeric_one_and_bool_true_identify_spam() {
    let art = proba(vec![ClassLabel::Int(0), ClassLabel::Int(1)], vec![0.7, 0.3]);
    let d = resolve("anything", Some(&art));
    assert_eq!(d.label, Label::NotSpam);
    assert_eq!(d.probability, 0.3);

    let art = proba(vec![ClassLabel::Bool(true), ClassLabel::Bool(false)], vec![0.6, 0.4]);
    let d = resolve("anything", Some(&art));
    assert_eq!(d.label, Label::Spam);
    assert_eq!(d.probability, 0.6);
}

#[test]
fn unknown_class_names_use_the_last_slot() {
    assert_eq!(spam_index(&[text("a"), text("b"), text("c")], 3), 2);
    let art = proba(vec![text("ok"), text("bad")], vec![0.35, 0.65]);
    let d = resolve("anything", Some(&art));
    assert_eq!(d.probability, 0.65);
    assert_eq!(d.label, Label::Spam);
}

#[test]
fn threshold_is_inclusive() {
    let art = proba(vec![text("ham"), text("spam")], vec![0.5, 0.5]);
    assert_eq!(resolve("anything", Some(&art)).label, Label::Spam);
}

#[test]
fn failed_probabilities_fall_back_to_bare_prediction() {
    let art = Artifacts::new(
        vectorizer(),
        Classifier::Probabilistic(Arc::new(ProbaStub {
            classes: vec![text("ham"), text("spam")],
            proba: Err(ClassifierFailure::NonFinite),
            label: Ok(text("spam")),
        })),
    );
    let (d, path) = resolve_with_path("anything", Some(&art));
    assert_eq!(path, ResolutionPath::BarePrediction);
    assert_eq!(d.label, Label::Spam);
    assert_eq!(d.probability, 1.0);
    assert!(!d.used_fallback);
}

#[test]
fn out_of_range_probability_counts_as_failure() {
    let art = Artifacts::new(
        vectorizer(),
        Classifier::Probabilistic(Arc::new(ProbaStub {
            classes: vec![text("ham"), text("spam")],
            proba: Ok(vec![0.1, f64::NAN]),
            label: Ok(text("ham")),
        })),
    );
    let (d, path) = resolve_with_path("anything", Some(&art));
    assert_eq!(path, ResolutionPath::BarePrediction);
    assert_eq!(d.label, Label::NotSpam);
    assert_eq!(d.probability, 1.0);
}

#[test]
fn short_probability_vector_counts_as_failure() {
    // "spam" sits at index 1 but only one probability came back.
    let art = Artifacts::new(
        vectorizer(),
        Classifier::Probabilistic(Arc::new(ProbaStub {
            classes: vec![text("ham"), text("spam")],
            proba: Ok(vec![0.9]),
            label: Ok(ClassLabel::Int(1)),
        })),
    );
    let (d, path) = resolve_with_path("anything", Some(&art));
    assert_eq!(path, ResolutionPath::BarePrediction);
    assert_eq!(d.label, Label::Spam);
}

#[test]
fn label_only_models_report_full_confidence() {
    let art = Artifacts::new(vectorizer(), Classifier::LabelOnly(Arc::new(LabelStub(Ok(ClassLabel::Int(0))))));
    let (d, path) = resolve_with_path("free prize", Some(&art));
    assert_eq!(path, ResolutionPath::BarePrediction);
    assert_eq!(d.label, Label::NotSpam);
    assert_eq!(d.probability, 1.0);
    assert!(!d.used_fallback);
}

#[test]
fn total_model_failure_degrades_to_keywords() {
    let failure = ClassifierFailure::DimensionMismatch { index: 9, width: 2 };
    let art = Artifacts::new(
        vectorizer(),
        Classifier::Probabilistic(Arc::new(ProbaStub {
            classes: vec![text("ham"), text("spam")],
            proba: Err(failure.clone()),
            label: Err(failure.clone()),
        })),
    );
    let (d, path) = resolve_with_path("urgent: claim now", Some(&art));
    assert_eq!(path, ResolutionPath::Keyword);
    assert_eq!(d.label, Label::Spam);
    assert_eq!(d.probability, 0.9);
    assert!(d.used_fallback);

    let art = Artifacts::new(vectorizer(), Classifier::LabelOnly(Arc::new(LabelStub(Err(failure)))));
    let d = resolve("see you soon", Some(&art));
    assert_eq!(d.label, Label::NotSpam);
    assert_eq!(d.probability, 0.05);
    assert!(d.used_fallback);
}

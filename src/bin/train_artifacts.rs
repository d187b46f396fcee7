//! Offline trainer: fit the TF-IDF vectorizer and logistic model on a labeled
//! SMS corpus, print a holdout report, and write the artifacts the server
//! discovers at startup.
//!
//! Usage: `train_artifacts [dataset.csv] [out_dir]`
//! (defaults: `backend/SPAM_SMS.csv`, `backend`)

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use tracing::info;

use spam_sms_classifier::artifacts::{
    save_pair, ALT_MODEL_FILES, ALT_VECTORIZER_FILES, PRIMARY_MODEL_FILE, PRIMARY_VECTORIZER_FILE,
};
use spam_sms_classifier::model::ClassifierFile;
use spam_sms_classifier::telemetry::init_tracing;
use spam_sms_classifier::train::{evaluate, fit, Dataset, TrainParams};

const HOLDOUT_EVERY: usize = 5;
const MAX_FEATURES: usize = 5000;

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let mut args = std::env::args().skip(1);
    let dataset = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("backend/SPAM_SMS.csv"));
    let out_dir = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("backend"));

    if !dataset.exists() {
        bail!("dataset not found at {}", dataset.display());
    }
    let mut ds = Dataset::load(&dataset).with_context(|| format!("loading {}", dataset.display()))?;
    let relabel = ds.ensure_two_classes()?;
    info!(rows = ds.len(), relabel = ?relabel, "dataset loaded");

    let (train, test) = ds.split_every(HOLDOUT_EVERY);
    let params = TrainParams {
        max_features: MAX_FEATURES,
        ..TrainParams::default()
    };
    let (vectorizer, file) = fit(&train, &params)?;
    info!(features = vectorizer.n_features(), train = train.len(), test = test.len(), "model fitted");

    if let ClassifierFile::LogisticRegression(model) = &file {
        println!("{:<10}{:>10}{:>10}{:>10}{:>10}", "", "precision", "recall", "f1", "support");
        for r in evaluate(&vectorizer, model, &test) {
            println!(
                "{:<10}{:>10.2}{:>10.2}{:>10.2}{:>10}",
                r.class, r.precision, r.recall, r.f1, r.support
            );
        }
    }

    let pairs = [
        (out_dir.join(PRIMARY_MODEL_FILE), out_dir.join(PRIMARY_VECTORIZER_FILE)),
        (out_dir.join(ALT_MODEL_FILES[0]), out_dir.join(ALT_VECTORIZER_FILES[0])),
    ];
    for (m, v) in &pairs {
        save_pair(m, v, &file, &vectorizer).with_context(|| format!("writing {}", m.display()))?;
        println!("saved {} and {}", m.display(), v.display());
    }
    Ok(())
}

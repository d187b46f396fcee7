//! decision.rs: label, per-request decision and its persisted history shape.
//!
//! `Decision` is what the resolver produces and the API returns; `HistoryEntry`
//! is the stable on-disk form (camelCase `isSpam`, `fallback`).

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Spam threshold on the estimated spam probability.
pub const SPAM_THRESHOLD: f64 = 0.5;

/// Binary verdict for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    #[serde(rename = "Spam")]
    Spam,
    #[serde(rename = "Not Spam")]
    NotSpam,
}

impl Label {
    pub fn from_probability(p: f64) -> Self {
        if p >= SPAM_THRESHOLD {
            Label::Spam
        } else {
            Label::NotSpam
        }
    }

    pub fn from_flag(is_spam: bool) -> Self {
        if is_spam {
            Label::Spam
        } else {
            Label::NotSpam
        }
    }

    pub fn is_spam(self) -> bool {
        matches!(self, Label::Spam)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Spam => "Spam",
            Label::NotSpam => "Not Spam",
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classification outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub text: String,
    pub label: Label,
    /// Estimated probability that the message is spam, in `[0.0, 1.0]`.
    /// Fixed at `1.0` when only a bare class prediction was available.
    pub probability: f64,
    pub used_fallback: bool,
    pub timestamp: DateTime<Utc>,
}

impl Decision {
    pub fn new(text: impl Into<String>, label: Label, probability: f64, used_fallback: bool) -> Self {
        Self {
            text: text.into(),
            label,
            probability: clamp01(probability),
            used_fallback,
            timestamp: Utc::now(),
        }
    }

    /// ISO-8601 UTC with microseconds and a `Z` suffix.
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

/// Persisted form of a `Decision`. Every field defaults so that hand-edited or
/// older entries still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_label")]
    pub label: String,
    #[serde(default)]
    pub probability: f64,
    #[serde(rename = "isSpam", default)]
    pub is_spam: bool,
    #[serde(default)]
    pub fallback: bool,
}

fn default_label() -> String {
    Label::NotSpam.as_str().to_string()
}

impl From<&Decision> for HistoryEntry {
    fn from(d: &Decision) -> Self {
        Self {
            timestamp: d.timestamp_iso(),
            text: d.text.clone(),
            label: d.label.as_str().to_string(),
            probability: d.probability,
            is_spam: d.label.is_spam(),
            fallback: d.used_fallback,
        }
    }
}

fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn label_wire_names() {
        assert_eq!(serde_json::to_value(Label::Spam).unwrap(), json!("Spam"));
        assert_eq!(serde_json::to_value(Label::NotSpam).unwrap(), json!("Not Spam"));
    }

    #[test]
    fn threshold_is_inclusive() {
        assert_eq!(Label::from_probability(0.5), Label::Spam);
        assert_eq!(Label::from_probability(0.4999), Label::NotSpam);
    }

    #[test]
    fn history_entry_shape_uses_camel_case_flag() {
        let d = Decision::new("hello", Label::Spam, 0.9, true);
        let v = serde_json::to_value(HistoryEntry::from(&d)).unwrap();
        assert_eq!(v["label"], json!("Spam"));
        assert_eq!(v["isSpam"], json!(true));
        assert_eq!(v["fallback"], json!(true));
        assert_eq!(v["text"], json!("hello"));
        let ts = v["timestamp"].as_str().unwrap();
        assert!(ts.ends_with('Z'), "timestamp should be UTC Z, got {ts}");
    }

    #[test]
    fn partial_entry_fills_defaults() {
        let e: HistoryEntry = serde_json::from_value(json!({ "text": "hi" })).unwrap();
        assert_eq!(e.label, "Not Spam");
        assert_eq!(e.probability, 0.0);
        assert!(!e.is_spam);
    }

    #[test]
    fn probability_is_clamped() {
        let d = Decision::new("x", Label::Spam, 1.7, false);
        assert!((d.probability - 1.0).abs() < 1e-12);
    }
}

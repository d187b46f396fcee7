//! Labeled SMS corpus: CSV reading, column detection, single-class repair.

use std::fs;
use std::path::Path;
use tracing::warn;

use crate::error::DatasetError;
use crate::resolver::keyword_match;

const TEXT_COLUMNS: [&str; 5] = ["text", "message", "sms", "msg", "message_text"];
const LABEL_COLUMNS: [&str; 3] = ["label", "class", "target"];

/// Upper bound on labels forced positive by `Relabel::Injected`.
pub const MAX_INJECTED: usize = 50;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    pub texts: Vec<String>,
    pub labels: Vec<bool>,
}

/// What `ensure_two_classes` had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relabel {
    AsIs,
    /// Labels replaced by the fallback keyword heuristic.
    Keyword,
    /// Keyword labels were still single-class; this many rows were forced positive.
    Injected(usize),
}

impl Dataset {
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let bytes = fs::read(path).map_err(|source| DatasetError::Read {
            path: path.display().to_string(),
            source,
        })?;
        // Public SMS corpora are often latin-1; keep going on bad bytes.
        Self::from_csv_str(&String::from_utf8_lossy(&bytes))
    }

    pub fn from_csv_str(content: &str) -> Result<Self, DatasetError> {
        let mut records = parse_csv(content).into_iter();
        let header = records.next().ok_or(DatasetError::NoHeader)?;
        let (label_col, text_col) = detect_columns(&header);

        let mut ds = Dataset::default();
        for rec in records {
            let (Some(label), Some(text)) = (rec.get(label_col), rec.get(text_col)) else {
                continue;
            };
            if label.trim().is_empty() || text.is_empty() {
                continue;
            }
            ds.texts.push(text.clone());
            ds.labels.push(is_spam_label(label));
        }
        if ds.texts.is_empty() {
            return Err(DatasetError::Empty);
        }
        Ok(ds)
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn has_two_classes(&self) -> bool {
        self.labels.iter().any(|&l| l) && self.labels.iter().any(|&l| !l)
    }

    /// Make the labels trainable.
    ///
    /// This fabricates labels. It keeps a bootstrap fit from failing on a
    /// one-class corpus and says nothing about model quality.
    pub fn ensure_two_classes(&mut self) -> Result<Relabel, DatasetError> {
        if self.has_two_classes() {
            return Ok(Relabel::AsIs);
        }
        warn!(rows = self.len(), "dataset labels contain a single class; relabeling by keyword");
        self.labels = self.texts.iter().map(|t| keyword_match(t)).collect();
        if self.has_two_classes() {
            return Ok(Relabel::Keyword);
        }

        warn!("keyword labels are single-class too; forcing a few positive labels");
        let n = self.len();
        let inject = (n / 10).min(MAX_INJECTED).max(1);
        let stride = (n / inject).max(1);
        let mut forced = 0;
        for i in (0..n).step_by(stride).take(inject) {
            self.labels[i] = true;
            forced += 1;
        }
        if self.has_two_classes() {
            Ok(Relabel::Injected(forced))
        } else {
            Err(DatasetError::SingleClass)
        }
    }

    /// Deterministic split: every `k`-th row goes to the holdout set.
    pub fn split_every(&self, k: usize) -> (Dataset, Dataset) {
        let k = k.max(2);
        let mut train = Dataset::default();
        let mut test = Dataset::default();
        for (i, (t, l)) in self.texts.iter().zip(&self.labels).enumerate() {
            let dst = if i % k == k - 1 { &mut test } else { &mut train };
            dst.texts.push(t.clone());
            dst.labels.push(*l);
        }
        (train, test)
    }
}

fn is_spam_label(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "spam" | "1" | "true")
}

/// `(label column, text column)`; falls back to columns 0 and 1.
/// When several headers qualify, the rightmost one wins.
fn detect_columns(header: &[String]) -> (usize, usize) {
    let find = |names: &[&str]| {
        header
            .iter()
            .rposition(|h| names.contains(&h.trim().to_ascii_lowercase().as_str()))
    };
    let label = find(&LABEL_COLUMNS).unwrap_or(0);
    let text = find(&TEXT_COLUMNS).unwrap_or(1);
    (label, text)
}

/// Minimal RFC 4180 reader: quoted fields, doubled quotes, CRLF or LF,
/// newlines inside quotes. Blank lines are skipped.
pub fn parse_csv(content: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.trim_start_matches('\u{feff}').chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                if !(record.len() == 1 && record[0].is_empty()) {
                    records.push(std::mem::take(&mut record));
                } else {
                    record.clear();
                }
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quotes_and_embedded_newlines() {
        let recs = parse_csv("a,b\r\n\"x, y\",\"he said \"\"hi\"\"\nok\"\n\nlast,row");
        assert_eq!(recs.len(), 3);
        assert_eq!(recs[1], vec!["x, y".to_string(), "he said \"hi\"\nok".to_string()]);
        assert_eq!(recs[2], vec!["last".to_string(), "row".to_string()]);
    }

    #[test]
    fn detects_named_columns_in_any_order() {
        let ds = Dataset::from_csv_str("Message,Class\nhello there,ham\nWIN cash,spam\n").unwrap();
        assert_eq!(ds.texts, vec!["hello there", "WIN cash"]);
        assert_eq!(ds.labels, vec![false, true]);
    }

    #[test]
    fn rightmost_matching_header_wins() {
        let ds = Dataset::from_csv_str("label,class,text,message\nspam,ham,first,second\n").unwrap();
        assert_eq!(ds.labels, vec![false]);
        assert_eq!(ds.texts, vec!["second"]);
    }

    #[test]
    fn unnamed_columns_default_to_label_then_text() {
        let ds = Dataset::from_csv_str("v1,v2,,\nham,see you soon,,\nspam,free voucher,,\n").unwrap();
        assert_eq!(ds.labels, vec![false, true]);
        assert_eq!(ds.texts[1], "free voucher");
    }

    #[test]
    fn rows_with_missing_fields_are_dropped() {
        let ds = Dataset::from_csv_str("label,text\nham,\n,orphan\nspam,ok\n").unwrap();
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn header_only_is_empty() {
        assert!(matches!(Dataset::from_csv_str("label,text\n"), Err(DatasetError::Empty)));
        assert!(matches!(Dataset::from_csv_str(""), Err(DatasetError::NoHeader)));
    }

    #[test]
    fn single_class_relabels_by_keyword() {
        let mut ds = Dataset {
            texts: vec!["free prize".into(), "see you".into()],
            labels: vec![false, false],
        };
        assert_eq!(ds.ensure_two_classes().unwrap(), Relabel::Keyword);
        assert_eq!(ds.labels, vec![true, false]);
    }

    #[test]
    fn injection_is_bounded_and_strided() {
        let n = 1000;
        let mut ds = Dataset {
            texts: (0..n).map(|i| format!("meeting notes {i}")).collect(),
            labels: vec![false; n],
        };
        assert_eq!(ds.ensure_two_classes().unwrap(), Relabel::Injected(50));
        let positives: Vec<usize> = ds.labels.iter().enumerate().filter(|(_, l)| **l).map(|(i, _)| i).collect();
        assert_eq!(positives.len(), 50);
        assert_eq!(positives[0], 0);
        assert_eq!(positives[1], 20);

        let mut small = Dataset {
            texts: (0..25).map(|i| format!("lunch {i}")).collect(),
            labels: vec![false; 25],
        };
        assert_eq!(small.ensure_two_classes().unwrap(), Relabel::Injected(2));
    }

    #[test]
    fn all_keyword_positive_single_row_cannot_be_repaired() {
        let mut ds = Dataset {
            texts: vec!["free cash".into()],
            labels: vec![true],
        };
        assert!(matches!(ds.ensure_two_classes(), Err(DatasetError::SingleClass)));
    }

    #[test]
    fn split_every_fifth_row() {
        let ds = Dataset {
            texts: (0..10).map(|i| i.to_string()).collect(),
            labels: vec![false; 10],
        };
        let (train, test) = ds.split_every(5);
        assert_eq!(test.texts, vec!["4", "9"]);
        assert_eq!(train.len(), 8);
    }
}

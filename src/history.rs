//! history.rs: file-backed, size-bounded decision log.
//!
//! The log is a JSON array of `HistoryEntry`, newest first, capped at
//! `HISTORY_CAP`. Every write goes through `persist::write_atomic`, so a reader
//! never observes a half-written file. In-process writers are serialized by a
//! mutex; separate processes may race on who wins last, but the file stays a
//! valid list after every completed write.
//!
//! Nothing in here propagates raw I/O errors. Reads degrade to an empty list
//! with a `HistoryFault`, appends degrade to `AppendOutcome::Degraded`.

use serde_json::Value;
use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{error, warn};

use crate::decision::{HistoryEntry, Label};
use crate::error::{ExportError, HistoryError};
use crate::persist::write_atomic;

pub const HISTORY_CAP: usize = 200;
pub const CSV_HEADER: [&str; 4] = ["Message", "Is Spam", "Confidence", "Timestamp"];

/// Why a read came back empty even though a file was present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryFault {
    InvalidJson,
    NotAList,
    Unreadable,
}

impl HistoryFault {
    pub fn message(self) -> &'static str {
        match self {
            HistoryFault::InvalidJson | HistoryFault::NotAList => "Invalid history data",
            HistoryFault::Unreadable => "Could not read history file",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistorySnapshot {
    pub entries: Vec<HistoryEntry>,
    pub fault: Option<HistoryFault>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Written { len: usize },
    Degraded,
}

#[derive(Debug)]
pub struct HistoryLog {
    path: PathBuf,
    cap: usize,
    write_lock: Mutex<()>,
}

impl HistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_capacity(path, HISTORY_CAP)
    }

    pub fn with_capacity(path: impl Into<PathBuf>, cap: usize) -> Self {
        Self {
            path: path.into(),
            cap: cap.max(1),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current entries, newest first. Absent file reads as empty with no fault.
    pub fn read(&self) -> HistorySnapshot {
        let (raw, fault) = self.load_raw();
        let entries = raw
            .into_iter()
            .enumerate()
            .filter_map(|(i, v)| match serde_json::from_value::<HistoryEntry>(v) {
                Ok(e) => Some(e),
                Err(e) => {
                    warn!(index = i, error = %e, "skipping malformed history element");
                    None
                }
            })
            .collect();
        HistorySnapshot { entries, fault }
    }

    /// Prepend `entry`, keep the newest `cap`, replace the file atomically.
    pub fn append(&self, entry: &HistoryEntry) -> AppendOutcome {
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());

        let (mut list, fault) = self.load_raw();
        if let Some(f) = fault {
            warn!(path = %self.path.display(), fault = ?f, "history unusable; starting a fresh log");
        }

        let value = match serde_json::to_value(entry) {
            Ok(v) => v,
            Err(e) => {
                error!(error = %e, "could not serialize history entry");
                self.recover_empty();
                return AppendOutcome::Degraded;
            }
        };
        list.insert(0, value);
        list.truncate(self.cap);

        match self.persist(&list) {
            Ok(()) => AppendOutcome::Written { len: list.len() },
            Err(e) => {
                error!(error = %e, "error saving history");
                self.recover_empty();
                AppendOutcome::Degraded
            }
        }
    }

    /// Leave a valid empty list in place.
    pub fn clear(&self) -> Result<(), HistoryError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());
        self.persist(&[]).inspect_err(|e| error!(error = %e, "error clearing history"))
    }

    /// CSV rendering of the log, newest first. A missing, empty or unreadable
    /// log has nothing to export.
    pub fn export_csv(&self) -> Result<Vec<u8>, ExportError> {
        let snap = self.read();
        if snap.entries.is_empty() {
            return Err(ExportError::NotFound);
        }
        Ok(render_csv(&snap.entries).into_bytes())
    }

    fn load_raw(&self) -> (Vec<Value>, Option<HistoryFault>) {
        let bytes = match fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return (Vec::new(), None),
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "error reading history file");
                return (Vec::new(), Some(HistoryFault::Unreadable));
            }
        };
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Array(list)) => (list, None),
            Ok(_) => {
                warn!(path = %self.path.display(), "history file did not contain a list");
                (Vec::new(), Some(HistoryFault::NotAList))
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "invalid JSON in history file");
                (Vec::new(), Some(HistoryFault::InvalidJson))
            }
        }
    }

    fn persist(&self, list: &[Value]) -> Result<(), HistoryError> {
        let bytes = serde_json::to_vec_pretty(list)?;
        write_atomic(&self.path, &bytes).map_err(|source| HistoryError::Io {
            path: self.path.display().to_string(),
            source,
        })
    }

    // Best effort: make sure later reads find a list rather than nothing.
    fn recover_empty(&self) {
        if self.path.exists() {
            return;
        }
        if let Err(e) = write_atomic(&self.path, b"[]") {
            error!(path = %self.path.display(), error = %e, "failed to create history file");
        }
    }
}

/// `Message, Is Spam, Confidence, Timestamp` with CRLF row endings.
pub fn render_csv(entries: &[HistoryEntry]) -> String {
    let mut out = String::new();
    push_row(&mut out, &CSV_HEADER.map(Cow::Borrowed));
    for e in entries {
        let is_spam = if e.label == Label::Spam.as_str() { "Yes" } else { "No" };
        push_row(
            &mut out,
            &[
                Cow::Borrowed(e.text.as_str()),
                Cow::Borrowed(is_spam),
                Cow::Owned(format_percent(e.probability)),
                Cow::Borrowed(e.timestamp.as_str()),
            ],
        );
    }
    out
}

/// `0.9` -> `90.00%`
pub fn format_percent(p: f64) -> String {
    format!("{:.2}%", p * 100.0)
}

fn push_row(out: &mut String, fields: &[Cow<'_, str>]) {
    for (i, f) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&csv_field(f));
    }
    out.push_str("\r\n");
}

// Quote only when needed; embedded quotes are doubled.
fn csv_field(s: &str) -> Cow<'_, str> {
    if s.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", s.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(text: &str, label: Label, p: f64) -> HistoryEntry {
        HistoryEntry {
            timestamp: "2025-01-01T00:00:00.000000Z".into(),
            text: text.into(),
            label: label.as_str().into(),
            probability: p,
            is_spam: label.is_spam(),
            fallback: true,
        }
    }

    #[test]
    fn percent_has_two_decimals() {
        assert_eq!(format_percent(0.9), "90.00%");
        assert_eq!(format_percent(0.05), "5.00%");
        assert_eq!(format_percent(1.0), "100.00%");
        assert_eq!(format_percent(0.12345), "12.35%");
    }

    #[test]
    fn csv_quotes_commas_quotes_and_newlines() {
        let rows = render_csv(&[entry("Hi, \"friend\"\nbye", Label::NotSpam, 0.05)]);
        let mut lines = rows.split("\r\n");
        assert_eq!(lines.next(), Some("Message,Is Spam,Confidence,Timestamp"));
        assert!(rows.contains("\"Hi, \"\"friend\"\"\nbye\",No,5.00%,2025-01-01T00:00:00.000000Z\r\n"));
    }

    #[test]
    fn csv_marks_spam_rows_yes() {
        let rows = render_csv(&[entry("free cash", Label::Spam, 0.9)]);
        assert!(rows.ends_with("free cash,Yes,90.00%,2025-01-01T00:00:00.000000Z\r\n"));
    }
}

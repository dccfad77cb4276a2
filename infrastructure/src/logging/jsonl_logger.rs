//! `pipeline.jsonl`: one JSON line per backend call of a run.
//!
//! Lines carry the event type, a UTC timestamp and a sequence number that
//! restarts at 1 whenever the log is reopened, so a re-run on the same day
//! shows up as a new sequence appended to the same file.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use themis_application::ports::call_logger::{CallEvent, CallLogOpener, CallLogger, NoCallLogger};
use themis_domain::RunLayout;
use tracing::warn;

#[derive(Serialize)]
struct CallRecord {
    seq: u64,
    timestamp: String,
    #[serde(rename = "type")]
    event_type: &'static str,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

/// Appends call events to a run's JSONL log
pub struct JsonlCallLogger {
    file: Mutex<File>,
    path: PathBuf,
    seq: AtomicU64,
}

impl JsonlCallLogger {
    /// Open `path` for appending, creating it and its parents
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
            path: path.to_path_buf(),
            seq: AtomicU64::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record(&self, event: CallEvent) -> CallRecord {
        let fields = match event.payload {
            Value::Object(map) => map,
            other => Map::from_iter([("data".to_string(), other)]),
        };
        CallRecord {
            seq: self.seq.fetch_add(1, Ordering::Relaxed) + 1,
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            event_type: event.event_type,
            fields,
        }
    }
}

impl CallLogger for JsonlCallLogger {
    fn log(&self, event: CallEvent) {
        let line = match serde_json::to_string(&self.record(event)) {
            Ok(line) => line,
            Err(e) => {
                warn!("Dropping call log event: {}", e);
                return;
            }
        };

        // Unbuffered: each call is on disk before the next one starts
        if let Ok(mut file) = self.file.lock()
            && let Err(e) = writeln!(file, "{}", line)
        {
            warn!("Could not write {}: {}", self.path.display(), e);
        }
    }
}

/// Opens `pipeline.jsonl` in the run directory of each run.
///
/// The call log never stops a run: when the file cannot be opened, events
/// are discarded.
pub struct JsonlCallLogOpener;

impl CallLogOpener for JsonlCallLogOpener {
    fn open(&self, layout: &RunLayout) -> Arc<dyn CallLogger> {
        let path = layout.run_log();
        match JsonlCallLogger::open(&path) {
            Ok(logger) => Arc::new(logger),
            Err(e) => {
                warn!("Call log disabled, cannot open {}: {}", path.display(), e);
                Arc::new(NoCallLogger)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use themis_domain::Model;

    fn read_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_event_fields_are_inlined() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.jsonl");
        let logger = JsonlCallLogger::open(&path).unwrap();

        logger.log(CallEvent::new(
            "question_answered",
            json!({"document": "indictment.pdf", "position": 3}),
        ));
        logger.log(CallEvent::new("note", json!("plain string")));

        let records = read_lines(&path);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["type"], "question_answered");
        assert_eq!(records[0]["document"], "indictment.pdf");
        assert_eq!(records[0]["position"], 3);
        assert!(records[0]["timestamp"].is_string());
        assert_eq!(records[1]["data"], "plain string");
    }

    #[test]
    fn test_sequence_restarts_when_reopened() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.jsonl");

        for _ in 0..2 {
            let logger = JsonlCallLogger::open(&path).unwrap();
            logger.log(CallEvent::new("question_answered", json!({})));
            logger.log(CallEvent::new("question_failed", json!({})));
        }

        let seqs: Vec<u64> = read_lines(&path)
            .iter()
            .map(|r| r["seq"].as_u64().unwrap())
            .collect();
        assert_eq!(seqs, vec![1, 2, 1, 2]);
    }

    #[test]
    fn test_opener_creates_log_in_run_dir() {
        let dir = tempfile::tempdir().unwrap();
        let layout = RunLayout::new(
            dir.path(),
            &Model::new("m1"),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        );

        JsonlCallLogOpener
            .open(&layout)
            .log(CallEvent::new("defense_generated", json!({"section": "timeline"})));

        let records = read_lines(&dir.path().join("20240315_m1/pipeline.jsonl"));
        assert_eq!(records[0]["section"], "timeline");
    }

    #[test]
    fn test_opener_falls_back_when_path_is_blocked() {
        let dir = tempfile::tempdir().unwrap();
        // A plain file where the run directory should be
        std::fs::write(dir.path().join("20240315_m1"), "").unwrap();
        let layout = RunLayout::new(
            dir.path(),
            &Model::new("m1"),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        );

        JsonlCallLogOpener
            .open(&layout)
            .log(CallEvent::new("question_answered", json!({})));
    }
}

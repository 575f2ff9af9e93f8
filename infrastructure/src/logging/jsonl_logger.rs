//! JSONL file writer for audit events.
//!
//! Each [`AuditEvent`] becomes one JSON line with `type` and `timestamp`
//! fields merged into its payload. The file is opened in append mode so the
//! trail survives across runs.

use mmagent_application::{AuditEvent, AuditLogger};
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every line and on `Drop`.
pub struct JsonlAuditLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlAuditLogger {
    /// Open (or create) the log at `path`, creating parent directories.
    ///
    /// Returns `None` if the file cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create audit log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open audit log {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn to_record(event: AuditEvent) -> Value {
    let timestamp = event
        .timestamp
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

    if let Value::Object(mut map) = event.payload {
        map.insert("type".to_string(), Value::String(event.event_type.to_string()));
        map.insert("timestamp".to_string(), Value::String(timestamp));
        Value::Object(map)
    } else {
        serde_json::json!({
            "type": event.event_type,
            "timestamp": timestamp,
            "data": event.payload,
        })
    }
}

impl AuditLogger for JsonlAuditLogger {
    fn log(&self, event: AuditEvent) {
        let Ok(line) = serde_json::to_string(&to_record(event)) else {
            return;
        };

        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        let _ = writeln!(writer, "{}", line);
        let _ = writer.flush();
    }
}

impl Drop for JsonlAuditLogger {
    fn drop(&mut self) {
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        let _ = writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn read_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_writes_one_record_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit").join("hitl.jsonl");
        let logger = JsonlAuditLogger::new(&path).unwrap();

        logger.log(AuditEvent::new(
            "hitl_requested",
            json!({"requestId": "r-1", "actionType": "file.delete"}),
        ));
        logger.log(AuditEvent::new("hitl_resolved", json!({"requestId": "r-1", "approved": false})));

        let records = read_lines(&path);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["type"], "hitl_requested");
        assert_eq!(records[0]["actionType"], "file.delete");
        assert!(records[0]["timestamp"].as_str().unwrap().ends_with('Z'));
        assert_eq!(records[1]["approved"], false);
    }

    #[test]
    fn test_non_object_payload_is_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jsonl");
        let logger = JsonlAuditLogger::new(&path).unwrap();
        logger.log(AuditEvent::new("note", json!("plain")));

        let records = read_lines(&path);
        assert_eq!(records[0]["data"], "plain");
        assert_eq!(records[0]["type"], "note");
    }

    #[test]
    fn test_appends_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jsonl");
        JsonlAuditLogger::new(&path)
            .unwrap()
            .log(AuditEvent::new("first", json!({})));
        JsonlAuditLogger::new(&path)
            .unwrap()
            .log(AuditEvent::new("second", json!({})));

        let records = read_lines(&path);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["type"], "second");
    }
}

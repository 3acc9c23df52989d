//! JSON-lines output
//!
//! Every event becomes one self-describing JSON object on its own line, tagged
//! by an `event` field (`status`, `divisor_found` or `message`). Write errors
//! are logged and dropped; a broken pipe must never stall a worker.

use super::StatusSink;
use crate::stats::{progress_percent, GlobalStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::sync::Mutex;
use tracing::warn;

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum JsonEvent<'a> {
    Status {
        status: &'a GlobalStatus,
        progress_percent: f64,
    },
    DivisorFound {
        divisor: u64,
        found_at: DateTime<Utc>,
    },
    Message {
        message: &'a str,
    },
}

pub struct JsonSink {
    writer: Mutex<Box<dyn Write + Send>>,
    progress_horizon: u64,
}

impl JsonSink {
    pub fn new(writer: Box<dyn Write + Send>, progress_horizon: u64) -> Self {
        Self {
            writer: Mutex::new(writer),
            progress_horizon,
        }
    }

    pub fn stdout(progress_horizon: u64) -> Self {
        Self::new(Box::new(std::io::stdout()), progress_horizon)
    }

    fn emit(&self, event: &JsonEvent<'_>) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to serialize output event: {}", e);
                return;
            }
        };

        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            warn!("Failed to write output event: {}", e);
        }
    }
}

impl StatusSink for JsonSink {
    fn render_status(&self, status: &GlobalStatus) {
        self.emit(&JsonEvent::Status {
            status,
            progress_percent: progress_percent(status, self.progress_horizon),
        });
    }

    fn render_divisor_found(&self, divisor: u64, found_at: DateTime<Utc>) {
        self.emit(&JsonEvent::DivisorFound { divisor, found_at });
    }

    fn render_message(&self, message: &str) {
        self.emit(&JsonEvent::Message { message });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn lines(&self) -> Vec<serde_json::Value> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8(bytes)
                .unwrap()
                .lines()
                .map(|l| serde_json::from_str(l).unwrap())
                .collect()
        }
    }

    #[test]
    fn test_one_object_per_event() {
        let buffer = SharedBuffer::default();
        let sink = JsonSink::new(Box::new(buffer.clone()), 1000);

        let status = GlobalStatus {
            largest_prime_tested: 500,
            ..GlobalStatus::empty(Utc::now())
        };
        sink.render_status(&status);
        sink.render_divisor_found(19, Utc::now());
        sink.render_message("coordinator unreachable");

        let lines = buffer.lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["event"], "status");
        assert_eq!(lines[0]["status"]["largest_prime_tested"], 500);
        assert_eq!(lines[0]["progress_percent"], 50.0);
        assert_eq!(lines[1]["event"], "divisor_found");
        assert_eq!(lines[1]["divisor"], 19);
        assert_eq!(lines[2]["event"], "message");
        assert_eq!(lines[2]["message"], "coordinator unreachable");
    }
}

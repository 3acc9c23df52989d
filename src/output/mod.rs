//! Status rendering
//!
//! The core never prints. Workers and status loops hand what they observe to a
//! `StatusSink`, which decides how (or whether) to show it. Sinks are shared
//! between pool workers, so every method takes `&self` and must return quickly.
//!
//! # Sinks
//!
//! - **Text**: human-readable console lines
//! - **Json**: one JSON object per line on any writer
//! - **Null**: discards everything
//! - **Recording**: keeps every event in memory (tests)

pub mod json;
pub mod text;

pub use json::JsonSink;
pub use text::TextSink;

use crate::config::OutputFormat;
use crate::stats::GlobalStatus;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

/// Rendering collaborator of the worker and status loops
pub trait StatusSink: Send + Sync {
    /// Render a freshly polled global status
    fn render_status(&self, status: &GlobalStatus);

    /// Render a divisor the moment a worker finds it
    fn render_divisor_found(&self, divisor: u64, found_at: DateTime<Utc>);

    /// Render an operational message (network failure, lost submission)
    fn render_message(&self, message: &str);
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl StatusSink for NullSink {
    fn render_status(&self, _status: &GlobalStatus) {}
    fn render_divisor_found(&self, _divisor: u64, _found_at: DateTime<Utc>) {}
    fn render_message(&self, _message: &str) {}
}

/// Event captured by a `RecordingSink`
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Status(GlobalStatus),
    DivisorFound(u64),
    Message(String),
}

/// Sink that keeps every event in memory
///
/// Clones share the event list.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<SinkEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Divisors rendered so far, in discovery order
    pub fn divisors(&self) -> Vec<u64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::DivisorFound(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Message(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: SinkEvent) {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).push(event);
    }
}

impl StatusSink for RecordingSink {
    fn render_status(&self, status: &GlobalStatus) {
        self.push(SinkEvent::Status(status.clone()));
    }

    fn render_divisor_found(&self, divisor: u64, _found_at: DateTime<Utc>) {
        self.push(SinkEvent::DivisorFound(divisor));
    }

    fn render_message(&self, message: &str) {
        self.push(SinkEvent::Message(message.to_string()));
    }
}

/// Build the sink selected in configuration
pub fn create_sink(format: OutputFormat, progress_horizon: u64) -> Arc<dyn StatusSink> {
    match format {
        OutputFormat::Text => Arc::new(TextSink::new(progress_horizon)),
        OutputFormat::Json => Arc::new(JsonSink::stdout(progress_horizon)),
        OutputFormat::None => Arc::new(NullSink),
    }
}

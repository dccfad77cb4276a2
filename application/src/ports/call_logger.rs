//! Port for structured backend call logging.
//!
//! Defines the [`CallLogger`] trait for recording every exchange with the LLM
//! backend (task, model, sizes, elapsed time, outcome) to a structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures a
//! machine-readable record of the run (JSONL).

use serde_json::Value;
use std::sync::Arc;
use themis_domain::RunLayout;

/// A structured call event for logging.
pub struct CallEvent {
    /// Event type identifier (e.g., "question_answered", "defense_generated").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl CallEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging call events to a structured log.
///
/// `log` is synchronous and infallible; implementations swallow their own
/// write errors.
pub trait CallLogger: Send + Sync {
    fn log(&self, event: CallEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoCallLogger;

impl CallLogger for NoCallLogger {
    fn log(&self, _event: CallEvent) {}
}

/// Opens the call log of one (case, model) run.
///
/// The batch mode runs several models in one process, each with its own run
/// directory and therefore its own log.
pub trait CallLogOpener: Send + Sync {
    fn open(&self, layout: &RunLayout) -> Arc<dyn CallLogger>;
}

impl CallLogOpener for NoCallLogger {
    fn open(&self, _layout: &RunLayout) -> Arc<dyn CallLogger> {
        Arc::new(NoCallLogger)
    }
}

//! Logging infrastructure: structured backend call logging.
//!
//! Provides [`JsonlCallLogger`], a JSONL file writer that implements the
//! [`CallLogger`](themis_application::CallLogger) port, and
//! [`JsonlCallLogOpener`] which places one log in each run directory.

mod jsonl_logger;

pub use jsonl_logger::{JsonlCallLogOpener, JsonlCallLogger};

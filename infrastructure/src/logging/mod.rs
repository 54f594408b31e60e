//! Logging infrastructure: structured progress event logging.
//!
//! Provides [`JsonlEventLogger`], a JSONL file writer that implements
//! the [`ProgressNotifier`](chatloop_application::ProgressNotifier) port.

mod jsonl_logger;

pub use jsonl_logger::JsonlEventLogger;

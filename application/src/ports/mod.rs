//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod cache_store;
pub mod clock;
pub mod completion_client;
pub mod composite_progress;
pub mod job_queue;
pub mod progress;
pub mod session_store;

//! Orchestration domain
//!
//! Terminal outcomes, progress events and execution modes of the
//! tool-calling loop. The loop itself lives in the application layer.
//!
//! ```text
//! Init → Requesting → (ToolCalls | FinalAnswer)
//!                          │
//!                          └─ Executing → Requesting → ...
//!                                               ↓
//!                                   Completed | Failed
//! ```

pub mod event;
pub mod mode;
pub mod value_objects;

pub use event::{EventKind, ProgressEnvelope, ProgressEvent};
pub use mode::RunMode;
pub use value_objects::{FailureReason, RunMetrics, RunOutcome};

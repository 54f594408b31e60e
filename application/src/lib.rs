//! Application layer for chatloop
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{CatalogPolicy, DEFAULT_TOOL_RESULT_PREFIX, ExecutionParams};
pub use ports::{
    cache_store::CacheStore,
    clock::{Clock, SystemClock},
    completion_client::{CompletionClient, CompletionError},
    composite_progress::CompositeProgressNotifier,
    job_queue::{ChatJob, JobHandler, JobQueue, QueueError},
    progress::{NoProgress, ProgressNotifier, ProgressSubscriber},
    session_store::{SessionStore, SessionStoreError},
};
pub use use_cases::chat_service::{
    Accepted, ChatError, ChatJobRunner, ChatRequest, ChatService, SyncReply,
};
pub use use_cases::orchestrate::{OrchestrationLoop, RunInput};
pub use use_cases::tool_catalog::{CatalogError, ToolCatalog};
pub use use_cases::tool_invoker::{InvocationError, ToolInvoker};

//! Infrastructure layer for chatloop
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod cache;
pub mod config;
pub mod events;
pub mod jan;
pub mod logging;
pub mod queue;
pub mod session;
pub mod tools;

// Re-export commonly used types
pub use cache::MemoryCacheStore;
pub use config::{ConfigLoader, FileConfig};
pub use events::EventHub;
pub use jan::{JanCompletionClient, JanSettings};
pub use logging::JsonlEventLogger;
pub use queue::{QueueSettings, TokioJobQueue};
pub use session::{InMemorySessionStore, JsonFileSessionStore};
pub use tools::{BuiltinState, HttpToolServer, InProcessToolServer, ReadingsTool, build_providers};

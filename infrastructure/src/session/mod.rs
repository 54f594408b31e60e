//! Session store adapters
//!
//! - [`InMemorySessionStore`]: process-local, used by tests and one-shot runs
//! - [`JsonFileSessionStore`]: one JSON document per conversation under
//!   `{dir}/{user_id}/{conversation_id}.json`

mod file;
mod memory;

pub use file::JsonFileSessionStore;
pub use memory::InMemorySessionStore;

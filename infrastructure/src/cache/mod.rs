//! Cache store adapters

mod memory;

pub use memory::MemoryCacheStore;

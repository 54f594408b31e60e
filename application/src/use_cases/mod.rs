//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod chat_service;
pub mod orchestrate;
pub(crate) mod shared;
pub mod tool_catalog;
pub mod tool_invoker;

#[cfg(test)]
pub(crate) mod test_support;

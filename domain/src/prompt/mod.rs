//! Prompt domain
//!
//! Fixed prompts the loop places into a conversation.

mod template;

pub use template::PromptTemplate;

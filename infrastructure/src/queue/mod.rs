//! Background job execution

mod worker;

pub use worker::{QueueSettings, TokioJobQueue};

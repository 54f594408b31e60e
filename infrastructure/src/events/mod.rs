//! Progress event delivery

mod hub;

pub use hub::{DEFAULT_CHANNEL_CAPACITY, EventHub};

//! Progress rendering

pub mod follow;
pub mod reporter;

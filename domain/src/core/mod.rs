//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`]: domain-level validation errors
//! - [`string::preview`]: single-line previews for logs and terminals
//! - [`validation::ConfigIssue`]: lenient configuration diagnostics

pub mod error;
pub mod string;
pub mod validation;

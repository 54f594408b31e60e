//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Message must not be empty")]
    EmptyMessage,

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}

/// Validate an id used in channel names and storage keys.
///
/// Allows ASCII alphanumerics, `-`, `_` and `.` (no path separators).
pub fn validate_identifier(id: &str) -> Result<(), DomainError> {
    let valid = !id.is_empty()
        && id.len() <= 128
        && id != "."
        && id != ".."
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(DomainError::InvalidIdentifier(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_error_display() {
        let error = DomainError::Cancelled;
        assert_eq!(error.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_is_cancelled_check() {
        assert!(DomainError::Cancelled.is_cancelled());
        assert!(!DomainError::EmptyMessage.is_cancelled());
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("conv-1_a.b").is_ok());
        assert!(validate_identifier("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("../etc").is_err());
        assert!(validate_identifier("..").is_err());
        assert!(validate_identifier("a b").is_err());
    }
}

//! Configuration issues.
//!
//! Configuration is validated leniently: problems are collected as
//! [`ConfigIssue`]s, reported to the user, and the loader falls back to a
//! working value instead of refusing to start.
//!
//! # Examples
//!
//! ```
//! use chatloop_domain::core::validation::{ConfigIssue, Severity};
//!
//! let issue = ConfigIssue::missing_field("servers.ops.url", "external server 'ops' has no url");
//! assert_eq!(issue.severity, Severity::Warning);
//! assert!(issue.to_string().contains("servers.ops.url"));
//! ```

use std::fmt;

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: a fallback is used instead.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// A string field holds a value outside its allowed set.
    InvalidEnumValue {
        field: String,
        value: String,
        valid_values: Vec<String>,
    },
    /// A field required by the surrounding settings is absent.
    MissingField { field: String },
    /// A field is present but unusable (zero limit, malformed url).
    InvalidValue { field: String, value: String },
}

/// A detected issue in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn missing_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code: ConfigIssueCode::MissingField { field: field.into() },
            message: message.into(),
        }
    }

    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            code: ConfigIssueCode::InvalidValue {
                field: field.into(),
                value: value.into(),
            },
            message: message.into(),
        }
    }

    pub fn invalid_enum(
        field: impl Into<String>,
        value: impl Into<String>,
        valid_values: &[&str],
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            code: ConfigIssueCode::InvalidEnumValue {
                field: field.into(),
                value: value.into(),
                valid_values: valid_values.iter().map(|v| v.to_string()).collect(),
            },
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        let field = match &self.code {
            ConfigIssueCode::InvalidEnumValue { field, .. }
            | ConfigIssueCode::MissingField { field }
            | ConfigIssueCode::InvalidValue { field, .. } => field,
        };
        write!(f, "{} [{}]: {}", level, field, self.message)
    }
}

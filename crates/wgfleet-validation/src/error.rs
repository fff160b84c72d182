//! Validation error types with detailed rejection reasons.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The kind of validation error that occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Input was empty when a value was required.
    Empty,
    /// Input contained dangerous shell metacharacters.
    ShellInjection {
        /// The dangerous character found.
        found: char,
    },
    /// Input contained path traversal sequences.
    PathTraversal {
        /// The traversal pattern found.
        pattern: String,
    },
    /// Input did not match expected format.
    InvalidFormat {
        /// Expected format description.
        expected: String,
        /// What was actually provided.
        actual: String,
    },
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "input cannot be empty"),
            Self::ShellInjection { found } => {
                write!(f, "shell metacharacter '{found}' not allowed")
            }
            Self::PathTraversal { pattern } => {
                write!(f, "path traversal pattern '{pattern}' detected")
            }
            Self::InvalidFormat { expected, actual } => {
                write!(f, "invalid format: expected {expected}, got '{actual}'")
            }
        }
    }
}

/// Error returned when validation fails.
#[derive(Debug, Clone, Error)]
#[error("validation failed for '{field}': {kind}")]
pub struct ValidationError {
    /// The name of the field that failed validation.
    pub field: String,
    /// The kind of validation error.
    pub kind: ValidationErrorKind,
    /// The offending path (if applicable).
    pub path: Option<PathBuf>,
}

impl ValidationError {
    /// Create a new validation error.
    #[must_use]
    pub fn new(field: impl Into<String>, kind: ValidationErrorKind) -> Self {
        Self {
            field: field.into(),
            kind,
            path: None,
        }
    }

    /// Create an "empty" validation error.
    #[must_use]
    pub fn empty(field: impl Into<String>) -> Self {
        Self::new(field, ValidationErrorKind::Empty)
    }

    /// Create a "shell injection" validation error.
    #[must_use]
    pub fn shell_injection(field: impl Into<String>, found: char) -> Self {
        Self::new(field, ValidationErrorKind::ShellInjection { found })
    }

    /// Create a "path traversal" validation error.
    #[must_use]
    pub fn path_traversal(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(
            field,
            ValidationErrorKind::PathTraversal {
                pattern: pattern.into(),
            },
        )
    }

    /// Create an "invalid format" validation error.
    #[must_use]
    pub fn invalid_format(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::new(
            field,
            ValidationErrorKind::InvalidFormat {
                expected: expected.into(),
                actual: actual.into(),
            },
        )
    }

    /// Set the path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Check if this is an empty error.
    #[must_use]
    pub fn is_empty_error(&self) -> bool {
        matches!(self.kind, ValidationErrorKind::Empty)
    }

    /// Check if this is a security-related error (injection, traversal).
    #[must_use]
    pub fn is_security_error(&self) -> bool {
        matches!(
            self.kind,
            ValidationErrorKind::ShellInjection { .. } | ValidationErrorKind::PathTraversal { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_error() {
        let err = ValidationError::empty("field");
        assert_eq!(err.field, "field");
        assert!(err.is_empty_error());
    }

    #[test]
    fn test_shell_injection_error() {
        let err = ValidationError::shell_injection("cmd", ';');
        assert!(err.is_security_error());
        assert!(err.to_string().contains("';'"));
    }

    #[test]
    fn test_path_traversal_error() {
        let err = ValidationError::path_traversal("path", "..");
        assert!(err.is_security_error());
        assert!(err.to_string().contains(".."));
    }

    #[test]
    fn test_invalid_format_not_security() {
        let err = ValidationError::invalid_format("endpoint", "host:port", "nope");
        assert!(!err.is_security_error());
    }

    #[test]
    fn test_with_path() {
        let err = ValidationError::path_traversal("path", "..").with_path("/tmp/test");
        assert!(err.path.is_some());
    }
}

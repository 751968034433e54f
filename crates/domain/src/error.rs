//! Unified error types for the domain layer
//!
//! Construction-time failures (bad pattern definitions, unparseable tags)
//! surface as `DomainError`. Runtime matcher faults use `MatchError`, which
//! the engine logs and swallows per pattern.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Validation failed (e.g., invalid field values)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Entity not found
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Business rule violation
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Parse error (for value objects)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl DomainError {
    /// Creates a validation error for business rule violations.
    ///
    /// Use this when domain invariants or constraints are violated:
    /// - Required fields are empty or missing
    /// - Values are outside allowed ranges
    /// - Rule shapes are degenerate (empty sequences, zero counts)
    ///
    /// # Example
    /// ```ignore
    /// if steps.is_empty() {
    ///     return Err(DomainError::validation("Sequence rule needs at least one step"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Create a constraint violation error
    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::Constraint(msg.into())
    }

    /// Creates a parse error for string-to-type conversion failures.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

/// A matcher failed while evaluating a single action.
///
/// Isolated to the pattern that raised it: the engine logs it and keeps
/// evaluating the remaining patterns for the same action.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MatchError {
    #[error("Matcher '{key}' failed: {message}")]
    Evaluation { key: String, message: String },

    #[error("Matcher state corrupted: {0}")]
    CorruptState(String),
}

impl MatchError {
    pub fn evaluation(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Evaluation {
            key: key.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = DomainError::validation("pattern name cannot be empty");
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(
            err.to_string(),
            "Validation failed: pattern name cannot be empty"
        );
    }

    #[test]
    fn test_not_found_error() {
        let err = DomainError::not_found("Pattern", "starfield-clicks");
        assert!(matches!(err, DomainError::NotFound { .. }));
        assert!(err.to_string().contains("Pattern"));
        assert!(err.to_string().contains("starfield-clicks"));
    }

    #[test]
    fn test_constraint_error() {
        let err = DomainError::constraint("duplicate pattern id");
        assert_eq!(err.to_string(), "Constraint violation: duplicate pattern id");
    }

    #[test]
    fn test_match_error_display() {
        let err = MatchError::evaluation("konami", "decoder exploded");
        assert_eq!(err.to_string(), "Matcher 'konami' failed: decoder exploded");
    }
}

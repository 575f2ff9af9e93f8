//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    #[error("Unknown priority: {0}")]
    UnknownPriority(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
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
        assert!(!DomainError::UnknownProvider("x".to_string()).is_cancelled());
        assert!(!DomainError::InvalidPayload("test".to_string()).is_cancelled());
    }
}

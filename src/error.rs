// Ledger error model
// Domain failures are closed variants so callers can match on the kind;
// storage failures pass through untouched.

use thiserror::Error;

/// Result type used across the ledger.
pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// An operation named an identifier that does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// A write would create a dangling reference, or a delete would leave one.
    #[error("referential violation: {0}")]
    ReferentialViolation(String),

    /// A transfer request that cannot form a valid pair.
    #[error("invalid transfer: {0}")]
    InvalidTransfer(String),

    /// A malformed field on create, update, or import.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Underlying storage failure.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

impl LedgerError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn referential(msg: impl Into<String>) -> Self {
        Self::ReferentialViolation(msg.into())
    }

    pub fn invalid_transfer(msg: impl Into<String>) -> Self {
        Self::InvalidTransfer(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// True for the variants a user can correct and retry.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Sqlite(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = LedgerError::not_found("account", 42);
        assert_eq!(err.to_string(), "account 42 not found");

        let err = LedgerError::invalid_transfer("source and destination are the same account");
        assert!(err.to_string().starts_with("invalid transfer:"));

        let err = LedgerError::validation("description must not be empty");
        assert_eq!(err.to_string(), "validation failed: description must not be empty");
    }

    #[test]
    fn test_recoverable_kinds() {
        assert!(LedgerError::not_found("category", 1).is_recoverable());
        assert!(LedgerError::referential("transactions still reference account 1").is_recoverable());
        assert!(!LedgerError::from(rusqlite::Error::InvalidQuery).is_recoverable());
    }
}

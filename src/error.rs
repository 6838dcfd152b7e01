//! Error types shared by the calculation engines and the temporal store
//!
//! Every failure carries a kind so callers can map it to a response without
//! matching on message text.

use thiserror::Error;

/// The main error type for hushall_core operations
#[derive(Error, Debug)]
pub enum FinanceError {
    /// Input rejected before any calculation started
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Payment never reduces principal
    #[error("Cannot amortize: payment {payment:.2} does not exceed accrued interest {interest:.2}")]
    CannotAmortize { payment: f64, interest: f64 },

    /// Monthly budget below the sum of minimum payments
    #[error("Insufficient budget: minimum payments require {required:.2}, available {available:.2}")]
    InsufficientBudget { required: f64, available: f64 },

    /// Simulation hit its ceiling or stopped converging
    #[error("Outcome could not be determined within {months} months")]
    Undeterminable { months: u32 },

    /// Entity not found (or not visible in the requested scope)
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Business rule violation for the entity's current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Optimistic concurrency check failed; the caller should reload and retry
    #[error("Write conflict on {identifier}: expected revision {expected}, found {actual}")]
    Conflict {
        identifier: String,
        expected: u64,
        actual: u64,
    },

    /// Backing store failure (poisoned lock, corrupted state)
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification of [`FinanceError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    CannotAmortize,
    InsufficientBudget,
    Undeterminable,
    NotFound,
    InvalidState,
    Conflict,
    Storage,
}

impl FinanceError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn not_found(entity_type: &'static str, identifier: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            identifier: identifier.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::CannotAmortize { .. } => ErrorKind::CannotAmortize,
            Self::InsufficientBudget { .. } => ErrorKind::InsufficientBudget,
            Self::Undeterminable { .. } => ErrorKind::Undeterminable,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Storage(_) | Self::Io(_) | Self::Csv(_) | Self::Json(_) => ErrorKind::Storage,
        }
    }

    /// Only write conflicts are worth retrying unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

pub type FinanceResult<T> = Result<T, FinanceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FinanceError::InsufficientBudget {
            required: 1500.0,
            available: 1000.0,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient budget: minimum payments require 1500.00, available 1000.00"
        );

        let err = FinanceError::not_found("Loan", 42);
        assert_eq!(err.to_string(), "Loan not found: 42");
    }

    #[test]
    fn test_only_conflicts_are_retryable() {
        let conflict = FinanceError::Conflict {
            identifier: "rate:1".into(),
            expected: 1,
            actual: 2,
        };
        assert!(conflict.is_retryable());
        assert_eq!(conflict.kind(), ErrorKind::Conflict);

        assert!(!FinanceError::InvalidState("closed".into()).is_retryable());
        assert!(!FinanceError::Undeterminable { months: 1200 }.is_retryable());
    }
}

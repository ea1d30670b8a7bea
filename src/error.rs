//! Error taxonomy shared by every engine component

use thiserror::Error;

use crate::UserId;

/// Broad classification of an [`EngineError`], used by callers to map failures
/// onto their own responses (e.g. HTTP status codes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Inputs were rejected before any computation ran
    Validation,
    /// A required record (retirement plan, budget) does not exist yet
    NotFound,
    /// An iteration cap was reached without convergence
    ComputationBound,
    /// The persistence collaborator failed
    Repository,
}

/// Errors produced by the projection engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("monthly payment {provided:.2} is below the required minimum of {required:.2}")]
    InsufficientPayment { required: f64, provided: f64 },

    #[error("forecast horizon must be positive, got {0} months")]
    InvalidHorizon(i32),

    #[error("unknown frequency: {0}")]
    UnknownFrequency(String),

    #[error("unknown payoff strategy: {0}")]
    UnknownStrategy(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no {resource} found for user {user_id}")]
    NotFound {
        resource: &'static str,
        user_id: UserId,
    },

    #[error("{computation} did not converge within {limit} iterations")]
    ComputationBound {
        computation: &'static str,
        limit: u32,
    },

    #[error("repository error: {0}")]
    Repository(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl EngineError {
    /// Wrap a failure from the persistence collaborator
    pub fn repository<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        EngineError::Repository(err.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InsufficientPayment { .. }
            | EngineError::InvalidHorizon(_)
            | EngineError::UnknownFrequency(_)
            | EngineError::UnknownStrategy(_)
            | EngineError::InvalidInput(_)
            | EngineError::Config(_) => ErrorKind::Validation,
            EngineError::NotFound { .. } => ErrorKind::NotFound,
            EngineError::ComputationBound { .. } => ErrorKind::ComputationBound,
            EngineError::Repository(_) | EngineError::Io(_) => ErrorKind::Repository,
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err = EngineError::InsufficientPayment { required: 150.0, provided: 100.0 };
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("150.00"));

        let err = EngineError::NotFound { resource: "retirement plan", user_id: 7 };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "no retirement plan found for user 7");

        let err = EngineError::ComputationBound { computation: "recurrence normalization", limit: 1200 };
        assert_eq!(err.kind(), ErrorKind::ComputationBound);

        let err = EngineError::repository("connection reset");
        assert_eq!(err.kind(), ErrorKind::Repository);
        assert!(std::error::Error::source(&err).is_some());
    }
}

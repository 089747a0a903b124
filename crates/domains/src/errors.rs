//! # DomainError
//!
//! Centralized error handling for the alumni hub.
//! Maps business-rule failures to actionable error kinds; the API layer
//! turns each kind into a status code.

use thiserror::Error;

/// The primary error type for all domain and service operations.
///
/// The `Display` output is the human-readable message sent to clients.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Referenced entity is absent or soft-deleted (e.g., "Forum", "Post")
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Authorization predicate failed
    #[error("{0}")]
    Forbidden(String),

    /// Business-rule violation (duplicate registration, last moderator, ...)
    #[error("{0}")]
    Conflict(String),

    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    /// No usable credentials on a request that needs them
    #[error("{0}")]
    Unauthenticated(String),

    /// Infrastructure failure (e.g., store unavailable, disk full)
    #[error("{0}")]
    Internal(String),
}

impl DomainError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Ports report failures through `anyhow`. An adapter may wrap a
/// `DomainError` (e.g. a rejected upload); that one is recovered as-is.
impl From<anyhow::Error> for DomainError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<DomainError>() {
            Ok(domain) => domain,
            Err(other) => DomainError::Internal(format!("{other:#}")),
        }
    }
}

/// A specialized Result type for domain logic.
pub type DomainResult<T> = std::result::Result<T, DomainError>;

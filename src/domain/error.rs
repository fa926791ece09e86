//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent invalid user input for domain values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("'{0}' is reserved and cannot be used as a profile name")]
    ReservedProfile(String),

    #[error("{value} is not valid! Authorized format: {format}")]
    InvalidNodeParam { value: String, format: &'static str },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

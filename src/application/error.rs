//! Application-level errors (wraps domain, config and infrastructure errors)

use thiserror::Error;

use crate::config::ConfigError;
use crate::domain::DomainError;
use crate::infrastructure::{HttpError, InfraError};

/// Application errors wrap lower layers and add command-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Infra(#[from] InfraError),

    #[error("{0}")]
    AuthenticationFailed(String),

    #[error("{0}")]
    ElementNotFound(String),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl From<HttpError> for ApplicationError {
    fn from(e: HttpError) -> Self {
        Self::Infra(InfraError::Http(e))
    }
}

impl ApplicationError {
    /// The remote failure behind this error, if any.
    pub fn http(&self) -> Option<&HttpError> {
        match self {
            Self::Infra(InfraError::Http(e)) => Some(e),
            _ => None,
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

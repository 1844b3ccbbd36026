//! The module contains the errors the application layer can return.

use domain::DomainError;
use thiserror::Error;
use uuid::Uuid;

/// Application custom errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ApplicationError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },
    #[error("validation failed with {} error(s)", .0.len())]
    Validation(Vec<DomainError>),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("inconsistent transfer batch: {0}")]
    InconsistentTransfer(String),
    #[error("repository error: {0}")]
    Repository(String),
}

impl From<Vec<DomainError>> for ApplicationError {
    fn from(errors: Vec<DomainError>) -> Self {
        Self::Validation(errors)
    }
}

pub type AppResult<T> = Result<T, ApplicationError>;

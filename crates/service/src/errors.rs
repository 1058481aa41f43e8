use thiserror::Error;

use models::errors::ModelError;

/// Failure kinds surfaced by CRUD application services.
///
/// Collaborator failures are passed through unchanged; the service never
/// substitutes a fallback value.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// Concurrent modification reported by the repository.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Any other persistence failure.
    #[error("database error: {0}")]
    Db(String),
}

/// Coarse classification for transport layers mapping errors to responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Repository,
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }

    pub fn conflict(msg: impl Into<String>) -> Self { Self::Conflict(msg.into()) }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Db(_) => ErrorKind::Repository,
        }
    }

    pub fn is_not_found(&self) -> bool { matches!(self, Self::NotFound(_)) }
}

impl From<ModelError> for ServiceError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(msg) => Self::Validation(msg),
            ModelError::Db(msg) => Self::Db(msg),
        }
    }
}

impl From<sea_orm::DbErr> for ServiceError {
    fn from(e: sea_orm::DbErr) -> Self { Self::Db(e.to_string()) }
}

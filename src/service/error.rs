use axum::http::StatusCode;
use thiserror::Error;

use crate::{db::StoreError, error::HttpError};

/// Terminal decisions of the core. None of these are retried; they are
/// surfaced as-is for the boundary to translate.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Email domain '{0}' may not request admin access")]
    DomainRestricted(String),

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Users cannot message themselves")]
    SelfMessage,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    /// Transient persistence failure; the store left no partial state behind.
    #[error("Storage error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::DuplicateEmail => ServiceError::DuplicateEmail,
            StoreError::NotFound(entity) => ServiceError::NotFound(entity.to_string()),
            StoreError::Conflict(reason) => ServiceError::InvalidState(reason),
            other => ServiceError::Store(other),
        }
    }
}

impl ServiceError {
    pub fn forbidden(action: impl Into<String>) -> Self {
        ServiceError::Forbidden(action.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,

            ServiceError::Forbidden(_) | ServiceError::DomainRestricted(_) => StatusCode::FORBIDDEN,

            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,

            ServiceError::InvalidState(_) | ServiceError::DuplicateEmail => StatusCode::CONFLICT,

            ServiceError::SelfMessage | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,

            ServiceError::Token(_) | ServiceError::Internal(_) | ServiceError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        let status = error.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %error, "internal failure");
        }
        HttpError::new(error.to_string(), status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_taxonomy() {
        assert!(matches!(
            ServiceError::from(StoreError::DuplicateEmail),
            ServiceError::DuplicateEmail
        ));
        assert!(matches!(
            ServiceError::from(StoreError::NotFound("Job")),
            ServiceError::NotFound(entity) if entity == "Job"
        ));
        assert!(matches!(
            ServiceError::from(StoreError::Conflict("job is in_progress".into())),
            ServiceError::InvalidState(_)
        ));
        assert!(matches!(
            ServiceError::from(StoreError::Database(sqlx::Error::PoolTimedOut)),
            ServiceError::Store(_)
        ));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ServiceError::Unauthorized("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ServiceError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ServiceError::DomainRestricted("gmail.com".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(ServiceError::NotFound("Job".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ServiceError::InvalidState("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(ServiceError::SelfMessage.status_code(), StatusCode::BAD_REQUEST);
    }
}

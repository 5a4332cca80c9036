use crate::db::errors::DbError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided
    #[error("Not authenticated")]
    Unauthenticated,

    /// Authenticated, but the principal's role does not satisfy the route
    #[error("Insufficient role to access {resource}")]
    Forbidden { resource: String },

    /// A required form field was empty or missing
    #[error("Missing required field: {field}")]
    Validation { field: String },

    /// Username already taken (case-sensitive exact match)
    #[error("Username already in use")]
    DuplicateUsername,

    /// Unknown username or wrong password - deliberately indistinguishable
    #[error("Incorrect username or password")]
    InvalidCredentials,

    /// Requested resource not found (includes malformed ids reaching a lookup)
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::DuplicateUsername => StatusCode::CONFLICT,
            Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details.
    ///
    /// This is what ends up in a flash message when a handler recovers the error.
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated => "Please log in to continue".to_string(),
            Error::Forbidden { .. } => "You do not have permission to view this page".to_string(),
            Error::Validation { .. } => "Please fill in all the fields".to_string(),
            Error::DuplicateUsername => "Username already in use, please try another".to_string(),
            Error::InvalidCredentials => "Incorrect username or password".to_string(),
            Error::NotFound { resource, .. } => format!("{resource} not found"),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { .. } if db_err.is_username_conflict() => {
                    "Username already in use, please try another".to_string()
                }
                DbError::UniqueViolation { .. } => "Resource already exists".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Unauthenticated | Error::Forbidden { .. } | Error::InvalidCredentials => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::Validation { .. } | Error::DuplicateUsername | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        (self.status_code(), self.user_message()).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

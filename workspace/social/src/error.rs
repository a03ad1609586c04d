use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use tracing::error;

/// Error types for the social domain layer.
///
/// The first five variants are expected outcomes of user input and map
/// directly onto HTTP client errors. The rest are internal failures.
#[derive(Error, Debug)]
pub enum SocialError {
    /// Malformed, missing or invalid input
    #[error("{0}")]
    BadRequest(String),

    /// Not logged in, or bad credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not permitted
    #[error("{0}")]
    Forbidden(String),

    /// Missing entity
    #[error("{0}")]
    NotFound(String),

    /// Duplicate of a unique value, e.g. a username
    #[error("{0}")]
    Conflict(String),

    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Error from password hashing or verification
    #[error("Password hash error: {0}")]
    PasswordHash(String),
}

impl SocialError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// True for failures caused by the caller rather than by the server.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Database(_) | Self::PasswordHash(_))
    }
}

impl From<argon2::password_hash::Error> for SocialError {
    fn from(error: argon2::password_hash::Error) -> Self {
        let err = SocialError::PasswordHash(error.to_string());
        error!(?err, "Password hashing failed");
        err
    }
}

/// Returns true when the store rejected a write because of a unique index.
pub(crate) fn is_unique_violation(error: &DbErr) -> bool {
    matches!(error.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Type alias for Result with SocialError
pub type Result<T> = std::result::Result<T, SocialError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_and_server_errors() {
        assert!(SocialError::bad_request("x").is_client_error());
        assert!(SocialError::Unauthorized("x".into()).is_client_error());
        assert!(SocialError::Forbidden("x".into()).is_client_error());
        assert!(SocialError::not_found("x").is_client_error());
        assert!(SocialError::Conflict("x".into()).is_client_error());
        assert!(!SocialError::Database(DbErr::Custom("x".into())).is_client_error());
        assert!(!SocialError::PasswordHash("x".into()).is_client_error());
    }
}

use axum::{
    Json,
    extract::rejection::{FormRejection, JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use social::SocialError;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::schemas::ErrorResponse;

/// Error returned by every handler; rendered as an [`ErrorResponse`] body.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }
}

impl From<SocialError> for ApiError {
    fn from(err: SocialError) -> Self {
        if err.is_client_error() {
            debug!("Request rejected: {}", err);
        } else {
            error!("Request failed: {}", err);
        }

        match err {
            SocialError::BadRequest(message) => Self::bad_request(message),
            SocialError::Unauthorized(message) => Self::unauthorized(message),
            SocialError::Forbidden(message) => {
                Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
            }
            SocialError::NotFound(message) => {
                Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
            }
            SocialError::Conflict(message) => Self::new(StatusCode::CONFLICT, "CONFLICT", message),
            SocialError::Database(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "Internal server error",
            ),
            SocialError::PasswordHash(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error",
            ),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Rejected JSON body: {}", rejection.body_text());
        Self::bad_request(rejection.body_text())
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        warn!("Rejected form body: {}", rejection.body_text());
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.message,
            code: self.code.to_string(),
            success: false,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_social_errors_map_to_status_codes() {
        let cases = [
            (SocialError::bad_request("x"), StatusCode::BAD_REQUEST),
            (SocialError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (SocialError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (SocialError::not_found("x"), StatusCode::NOT_FOUND),
            (SocialError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                SocialError::Database(sea_orm::DbErr::Custom("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = ApiError::from(SocialError::Database(sea_orm::DbErr::Custom(
            "secret table layout".into(),
        )));
        assert_eq!(err.message, "Internal server error");
        assert_eq!(err.code, "DATABASE_ERROR");
    }
}

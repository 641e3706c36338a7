//! Error → HTTP mapping

use crate::models::{ApiResponse, ErrorResponse};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tuition_common::TuitionError;

/// Handler error
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, malformed or expired credentials
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Domain(#[from] TuitionError),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden() -> Self {
        Self::Domain(TuitionError::Forbidden)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Domain(err) => match err {
                TuitionError::Validation(_) | TuitionError::AlreadyPaid => StatusCode::BAD_REQUEST,
                TuitionError::NotFound { .. } => StatusCode::NOT_FOUND,
                TuitionError::Forbidden => StatusCode::FORBIDDEN,
                TuitionError::Conflict(_) => StatusCode::CONFLICT,
                TuitionError::Gateway(_) | TuitionError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            Self::Unauthorized(message) => ErrorResponse::new("unauthorized", message),
            Self::Domain(err) => match err {
                TuitionError::Validation(fields) => {
                    ErrorResponse::new("validation_error", "Invalid input.").with_details(fields.clone())
                }
                TuitionError::Conflict(fields) => {
                    ErrorResponse::new("conflict", "Already exists.").with_details(fields.clone())
                }
                TuitionError::AlreadyPaid => ErrorResponse::new("already_paid", "Fee already paid"),
                TuitionError::NotFound { entity, .. } => {
                    ErrorResponse::new("not_found", &format!("{} not found", entity))
                }
                TuitionError::Forbidden => ErrorResponse::new("forbidden", "forbidden"),
                TuitionError::Gateway(message) => ErrorResponse::new("gateway_error", message),
                TuitionError::Storage(_) => ErrorResponse::new("internal_error", "Internal server error"),
            },
            Self::Internal(_) => ErrorResponse::new("internal_error", "Internal server error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        (status, Json(ApiResponse::<()>::failure(self.body()))).into_response()
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Unauthorized(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tuition_common::FieldErrors;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (TuitionError::invalid("amount", "bad"), StatusCode::BAD_REQUEST),
            (TuitionError::AlreadyPaid, StatusCode::BAD_REQUEST),
            (TuitionError::not_found("installment", "x"), StatusCode::NOT_FOUND),
            (TuitionError::Forbidden, StatusCode::FORBIDDEN),
            (TuitionError::Conflict(FieldErrors::single("code", "taken")), StatusCode::CONFLICT),
            (TuitionError::Gateway("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (TuitionError::Storage("disk".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
        assert_eq!(ApiError::unauthorized("no token").status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_forbidden_gives_no_detail() {
        let body = ApiError::forbidden().body();
        assert_eq!(body.message, "forbidden");
        assert!(body.details.is_none());
    }

    #[test]
    fn test_validation_carries_fields() {
        let body = ApiError::from(TuitionError::invalid("amount", "Must be positive.")).body();
        let details = body.details.unwrap();
        assert_eq!(details.get("amount").unwrap(), ["Must be positive.".to_string()]);
    }
}

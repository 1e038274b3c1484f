use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::ParseEnumError;
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

/// Envelope returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Always `false`.
    #[schema(example = false)]
    pub success: bool,
    /// Always `null`.
    #[schema(value_type = Option<Object>, example = json!(null))]
    pub data: Option<()>,
    /// Human-readable error description.
    #[schema(example = "Course not found")]
    pub message: String,
    /// Additional detail for business-rule rejections.
    #[schema(example = "Student may already be enrolled or course settings don't allow enrollment")]
    pub errors: Option<String>,
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `PERMISSION_DENIED`, `NOT_FOUND`,
    /// `CONFLICT`, `EMAIL_TAKEN`, `REJECTED`, `INTERNAL_ERROR`.
    #[schema(example = "NOT_FOUND")]
    pub code: &'static str,
}

impl ErrorBody {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: message.into(),
            errors: None,
            code,
        }
    }
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    PermissionDenied,
    NotFound(String),
    Conflict(String),
    EmailTaken,
    /// A guarded operation declined to act (enrollment full, already joined, ...).
    Rejected {
        message: String,
        reason: String,
    },
    Internal(String),
}

impl AppError {
    pub fn rejected(message: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Rejected {
            message: message.into(),
            reason: reason.into(),
        }
    }

    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("VALIDATION_ERROR", msg),
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("TOKEN_MISSING", "Authentication required"),
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("TOKEN_INVALID", "Invalid or expired token"),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("INVALID_CREDENTIALS", "Invalid email or password"),
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                ErrorBody::new("PERMISSION_DENIED", "Insufficient permissions"),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorBody::new("NOT_FOUND", msg)),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ErrorBody::new("CONFLICT", msg)),
            AppError::EmailTaken => (
                StatusCode::CONFLICT,
                ErrorBody::new("EMAIL_TAKEN", "Email is already registered"),
            ),
            AppError::Rejected { message, reason } => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    errors: Some(reason),
                    ..ErrorBody::new("REJECTED", message)
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("INTERNAL_ERROR", "An unexpected error occurred"),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<ParseEnumError> for AppError {
    fn from(err: ParseEnumError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        if err.is_client_error() {
            AppError::Validation(err.to_string())
        } else {
            AppError::Internal(err.to_string())
        }
    }
}

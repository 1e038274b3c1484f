use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Envelope wrapping every successful response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ApiResponse<T> {
    /// Always `true` for successful responses.
    #[schema(example = true)]
    pub success: bool,
    /// Response payload, `null` for deletions.
    pub data: Option<T>,
    /// Optional human-readable confirmation.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Institution course created successfully")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            message: None,
        })
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        })
    }
}

/// Success envelope without a payload (`data: null`), used by deletions.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(value_type = Option<Object>, example = json!(null))]
    pub data: Option<()>,
    #[schema(example = "Challenge deleted successfully")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            data: None,
            message: message.into(),
        })
    }
}

/// Query string for the `search` endpoints.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct SearchQuery {
    /// Case-insensitive substring to look for.
    pub query: String,
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Validate a trimmed required text field (1-`max` Unicode characters).
pub fn validate_required(value: &str, field: &str, max: usize) -> Result<(), AppError> {
    let value = value.trim();
    if value.is_empty() || value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{field} must be 1-{max} characters"
        )));
    }
    Ok(())
}

/// Validate an optional text field (at most `max` Unicode characters).
pub fn validate_optional(value: Option<&str>, field: &str, max: usize) -> Result<(), AppError> {
    if let Some(value) = value
        && value.chars().count() > max
    {
        return Err(AppError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// Minimal e-mail shape check: something on both sides of a single `@`.
pub fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && email.len() <= 254
        }
        None => false,
    };
    if !valid {
        return Err(AppError::Validation("Email must be a valid address".into()));
    }
    Ok(())
}

/// Validate an optional non-negative number.
pub fn validate_non_negative<T>(value: Option<T>, field: &str) -> Result<(), AppError>
where
    T: PartialOrd + Default,
{
    if let Some(value) = value
        && value < T::default()
    {
        return Err(AppError::Validation(format!("{field} must be >= 0")));
    }
    Ok(())
}

/// Normalise an optional text field: trimmed, blank becomes `None`.
pub fn trim_opt(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

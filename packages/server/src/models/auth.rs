use common::Role;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::shared::{validate_email, validate_required};
use crate::models::user::validate_password;

/// Request body for self sign-up.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[schema(example = "Maria Silva")]
    pub name: String,
    #[schema(example = "maria@escola.br")]
    pub email: String,
    /// Password (6-128 characters).
    #[schema(example = "s3cure!")]
    pub password: String,
    /// Requested role. Only platform admins may register accounts with a role
    /// other than `USER`; for everyone else it is ignored.
    pub role: Option<Role>,
    /// Institution the new account is affiliated with.
    pub institution_id: Option<i32>,
    pub phone: Option<String>,
}

pub fn validate_register_request(payload: &RegisterRequest) -> Result<(), AppError> {
    validate_required(&payload.name, "Name", 256)?;
    validate_email(&payload.email)?;
    validate_password(&payload.password)
}

/// Request body for user login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "maria@escola.br")]
    pub email: String,
    #[schema(example = "s3cure!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.email.trim().is_empty() {
        return Err(AppError::Validation("Email must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Issued token and the identity it carries.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// JWT bearer token.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    pub role: Role,
    #[schema(example = 3)]
    pub user_id: i32,
    #[schema(example = "Maria Silva")]
    pub name: String,
    pub institution_id: Option<i32>,
}

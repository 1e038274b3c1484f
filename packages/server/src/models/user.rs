use chrono::{DateTime, Utc};
use common::Role;
use serde::{Deserialize, Serialize};

use crate::entity::user;
use crate::error::AppError;
use crate::models::shared::{validate_email, validate_required};

pub fn validate_password(password: &str) -> Result<(), AppError> {
    let len = password.chars().count();
    if !(6..=128).contains(&len) {
        return Err(AppError::Validation(
            "Password must be 6-128 characters".into(),
        ));
    }
    Ok(())
}

/// Request body for creating a user (admin action).
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[schema(example = "Maria Silva")]
    pub name: String,
    #[schema(example = "maria@escola.br")]
    pub email: String,
    #[schema(example = "s3cure!")]
    pub password: String,
    /// Defaults to `USER`.
    pub role: Option<Role>,
    pub institution_id: Option<i32>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
}

pub fn validate_create_user(payload: &CreateUserRequest) -> Result<(), AppError> {
    validate_required(&payload.name, "Name", 256)?;
    validate_email(&payload.email)?;
    validate_password(&payload.password)
}

/// Request body for updating a user profile.
///
/// `role` and `institutionId` are only honoured for platform admins.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[schema(example = "Maria Silva")]
    pub name: String,
    #[schema(example = "maria@escola.br")]
    pub email: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    /// New password; unchanged when omitted.
    pub password: Option<String>,
    pub role: Option<Role>,
    /// Omitted keeps the current institution, `null` detaches the user.
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<i32>)]
    pub institution_id: Option<Option<i32>>,
}

/// Wraps any value that is present in the body, `null` included, in `Some`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

pub fn validate_update_user(payload: &UpdateUserRequest) -> Result<(), AppError> {
    validate_required(&payload.name, "Name", 256)?;
    validate_email(&payload.email)?;
    if let Some(password) = &payload.password {
        validate_password(password)?;
    }
    Ok(())
}

/// Public user profile. Never includes the password hash.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(example = 3)]
    pub id: i32,
    #[schema(example = "Maria Silva")]
    pub name: String,
    #[schema(example = "maria@escola.br")]
    pub email: String,
    pub role: Role,
    pub institution_id: Option<i32>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    /// Points earned by completing challenges.
    #[schema(example = 150)]
    pub score: i32,
    pub enrolled_course_ids: Vec<i32>,
    pub participating_challenge_ids: Vec<i32>,
    pub completed_challenge_ids: Vec<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user row with the ids of everything it is linked to.
pub struct UserProfile {
    pub user: user::Model,
    pub enrolled_course_ids: Vec<i32>,
    pub participating_challenge_ids: Vec<i32>,
    pub completed_challenge_ids: Vec<i32>,
}

impl From<UserProfile> for UserResponse {
    fn from(p: UserProfile) -> Self {
        let u = p.user;
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
            institution_id: u.institution_id,
            phone: u.phone,
            avatar: u.avatar,
            score: u.score,
            enrolled_course_ids: p.enrolled_course_ids,
            participating_challenge_ids: p.participating_challenge_ids,
            completed_challenge_ids: p.completed_challenge_ids,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

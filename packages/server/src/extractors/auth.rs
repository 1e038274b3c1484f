use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use common::Role;
use sea_orm::EntityTrait;
use tracing::debug;

use crate::entity::user;
use crate::error::AppError;
use crate::policy::{self, Action, Caller};
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication.
/// Authorization happens via `authorize()` / `require_self_or_admin()` in the handler body.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
    pub role: Role,
    pub institution_id: Option<i32>,
}

impl AuthUser {
    pub fn caller(&self) -> Caller {
        Caller {
            user_id: self.user_id,
            role: self.role,
            institution_id: self.institution_id,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Returns `Ok(())` if the policy allows `action` on a resource owned by
    /// `resource_institution`, `Err(PermissionDenied)` otherwise.
    pub fn authorize(&self, resource_institution: Option<i32>, action: Action) -> Result<(), AppError> {
        if policy::decide(Some(&self.caller()), resource_institution, action).is_allowed() {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    pub fn require_self_or_admin(&self, user_id: i32) -> Result<(), AppError> {
        if policy::same_user_or_admin(Some(&self.caller()), user_id).is_allowed() {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<Result<&str, AppError>> {
    let header = parts.headers.get("Authorization")?;
    let token = header
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AppError::TokenInvalid);
    Some(token)
}

/// Verify the token, then resolve the caller from the database so that role
/// and institution changes (or deletion) take effect immediately.
async fn decode(token: &str, state: &AppState) -> Result<AuthUser, AppError> {
    let claims = jwt::verify(token, &state.config.auth.jwt_secret)
        .map_err(|_| AppError::TokenInvalid)?;

    let Some(user) = user::Entity::find_by_id(claims.uid).one(&state.db).await? else {
        debug!(user_id = claims.uid, "Token subject no longer exists");
        return Err(AppError::TokenInvalid);
    };

    Ok(AuthUser {
        user_id: user.id,
        email: user.email,
        role: user.role,
        institution_id: user.institution_id,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::TokenMissing)??;
        decode(token, state).await
    }
}

/// `Option<AuthUser>` for endpoints where signing in is optional: no header
/// yields `None`, a bad token is still rejected.
impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        match bearer_token(parts) {
            None => Ok(None),
            Some(token) => decode(token?, state).await.map(Some),
        }
    }
}

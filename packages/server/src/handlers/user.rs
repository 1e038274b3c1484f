use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::TransactionTrait;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppPath};
use crate::models::shared::{ApiResponse, MessageResponse};
use crate::models::user::{
    CreateUserRequest, UpdateUserRequest, UserResponse, validate_create_user,
    validate_update_user,
};
use crate::policy::Action;
use crate::services;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Users",
    operation_id = "listUsers",
    summary = "List all users",
    description = "Returns every user. Requires `ADMIN` or `INSTITUTION_ADMIN`.",
    responses(
        (status = 200, description = "Users", body = ApiResponse<Vec<UserResponse>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_users(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.authorize(None, Action::ListUsers)?;
    let users = services::user::list_users(&state.db).await?;
    Ok(ApiResponse::ok(
        users.into_iter().map(UserResponse::from).collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Users",
    operation_id = "getCurrentUser",
    summary = "Get the signed-in user",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Account no longer exists (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let profile = services::user::get_user(&state.db, auth_user.user_id).await?;
    Ok(ApiResponse::ok(UserResponse::from(profile)))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Users",
    operation_id = "getUser",
    summary = "Get a user by ID",
    description = "Users may read their own profile; admins may read any.",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn get_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_self_or_admin(id)?;
    let profile = services::user::get_user(&state.db, id).await?;
    Ok(ApiResponse::ok(UserResponse::from(profile)))
}

#[utoipa::path(
    get,
    path = "/institution/{institution_id}",
    tag = "Users",
    operation_id = "listInstitutionUsers",
    summary = "List the members of an institution",
    description = "Requires `ADMIN`, or `INSTITUTION_ADMIN` of that institution.",
    params(("institution_id" = i32, Path, description = "Institution ID")),
    responses(
        (status = 200, description = "Users", body = ApiResponse<Vec<UserResponse>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_institution_users(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(institution_id): AppPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.authorize(Some(institution_id), Action::ListInstitutionUsers)?;
    let users = services::user::list_by_institution(&state.db, institution_id).await?;
    Ok(ApiResponse::ok(
        users.into_iter().map(UserResponse::from).collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Users",
    operation_id = "createUser",
    summary = "Create a user",
    description = "Creates an account with any role. Requires `ADMIN`.",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Institution not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Email already registered (EMAIL_TAKEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(email = %payload.email))]
pub async fn create_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;
    validate_create_user(&payload)?;

    let txn = state.db.begin().await?;
    let profile = services::user::create_user(&txn, payload).await?;
    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(UserResponse::from(profile), "User created successfully"),
    ))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Users",
    operation_id = "updateUser",
    summary = "Update a user",
    description = "Users may edit their own profile; admins may edit any. `role` and \
        `institutionId` are ignored unless the caller is `ADMIN`; `institutionId: null` detaches \
        the user. Omitting `password` or `institutionId` keeps it.",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<UserResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Email already registered (EMAIL_TAKEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_self_or_admin(id)?;
    validate_update_user(&payload)?;

    let txn = state.db.begin().await?;
    let profile = services::user::update_user(&txn, id, payload, auth_user.is_admin()).await?;
    txn.commit().await?;

    Ok(ApiResponse::with_message(
        UserResponse::from(profile),
        "User updated successfully",
    ))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Users",
    operation_id = "deleteUser",
    summary = "Delete a user",
    description = "Removes the account with its enrollments and challenge records. Requires `ADMIN`.",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;

    let txn = state.db.begin().await?;
    services::user::delete_user(&txn, id).await?;
    txn.commit().await?;

    Ok(MessageResponse::new("User deleted successfully"))
}

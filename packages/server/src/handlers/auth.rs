use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::TransactionTrait;
use tracing::instrument;

use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::{
    AuthResponse, LoginRequest, RegisterRequest, validate_login_request,
    validate_register_request,
};
use crate::models::shared::ApiResponse;
use crate::services;
use crate::state::AppState;
use crate::utils::jwt;

fn issue_token(state: &AppState, user: user::Model) -> Result<AuthResponse, AppError> {
    let token = jwt::sign(
        user.id,
        &user.email,
        user.role,
        user.institution_id,
        &state.config.auth.jwt_secret,
        state.config.auth.token_ttl_hours,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {e}")))?;

    Ok(AuthResponse {
        token,
        role: user.role,
        user_id: user.id,
        name: user.name,
        institution_id: user.institution_id,
    })
}

#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    operation_id = "register",
    summary = "Register a new account",
    description = "Creates an account and returns a signed token for it. The `role` field is \
        only honoured when the request is made by a platform admin; everyone else is registered \
        as `USER`.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Institution not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Email already registered (EMAIL_TAKEN)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, caller, payload), fields(email = %payload.email))]
pub async fn register(
    caller: Option<AuthUser>,
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_register_request(&payload)?;
    let privileged = caller.as_ref().is_some_and(AuthUser::is_admin);

    let txn = state.db.begin().await?;
    let user = services::user::register(&txn, payload, privileged).await?;
    txn.commit().await?;

    let body = issue_token(&state, user)?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(body, "User registered successfully"),
    ))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in",
    description = "Exchanges an e-mail and password for a bearer token.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Wrong e-mail or password (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_login_request(&payload)?;

    let user = services::user::authenticate(&state.db, &payload).await?;
    let body = issue_token(&state, user)?;
    Ok(ApiResponse::with_message(body, "Login successful"))
}

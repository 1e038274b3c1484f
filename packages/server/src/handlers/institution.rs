use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::InstitutionStatus;
use sea_orm::TransactionTrait;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppPath};
use crate::models::institution::{
    InstitutionRequest, InstitutionResponse, validate_institution_request,
};
use crate::models::shared::{ApiResponse, MessageResponse, SearchQuery};
use crate::policy::Action;
use crate::services;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Institutions",
    operation_id = "listInstitutions",
    summary = "List institutions",
    responses(
        (status = 200, description = "Institutions", body = ApiResponse<Vec<InstitutionResponse>>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_institutions(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let rows = services::institution::list_institutions(&state.db).await?;
    Ok(ApiResponse::ok(
        rows.into_iter()
            .map(InstitutionResponse::from)
            .collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    get,
    path = "/search",
    tag = "Institutions",
    operation_id = "searchInstitutions",
    summary = "Search institutions by name",
    description = "Case-insensitive substring match on the institution name.",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching institutions", body = ApiResponse<Vec<InstitutionResponse>>),
        (status = 400, description = "Missing query (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query), fields(query = %query.query))]
pub async fn search_institutions(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let rows = services::institution::search_institutions(&state.db, &query.query).await?;
    Ok(ApiResponse::ok(
        rows.into_iter()
            .map(InstitutionResponse::from)
            .collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Institutions",
    operation_id = "getInstitution",
    summary = "Get an institution by ID",
    params(("id" = i32, Path, description = "Institution ID")),
    responses(
        (status = 200, description = "Institution", body = ApiResponse<InstitutionResponse>),
        (status = 404, description = "Institution not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_institution(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    let model = services::institution::find_institution(&state.db, id).await?;
    Ok(ApiResponse::ok(InstitutionResponse::from(model)))
}

#[utoipa::path(
    get,
    path = "/status/{status}",
    tag = "Institutions",
    operation_id = "listInstitutionsByStatus",
    summary = "List institutions by status",
    description = "Requires `ADMIN`. Status is one of `ACTIVE`, `INACTIVE`, `PENDING` (case-insensitive).",
    params(("status" = InstitutionStatus, Path, description = "Institution status")),
    responses(
        (status = 200, description = "Institutions", body = ApiResponse<Vec<InstitutionResponse>>),
        (status = 400, description = "Unknown status (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_institutions_by_status(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(status): AppPath<String>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;
    let status: InstitutionStatus = status.parse()?;
    let rows = services::institution::list_by_status(&state.db, status).await?;
    Ok(ApiResponse::ok(
        rows.into_iter()
            .map(InstitutionResponse::from)
            .collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Institutions",
    operation_id = "createInstitution",
    summary = "Create an institution",
    description = "Open sign-up for a new tenant. Settings default to open enrollment without \
        approval and 100 students per course.",
    request_body = InstitutionRequest,
    responses(
        (status = 201, description = "Institution created", body = ApiResponse<InstitutionResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(name = %payload.name))]
pub async fn create_institution(
    State(state): State<AppState>,
    AppJson(payload): AppJson<InstitutionRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_institution_request(&payload)?;

    let txn = state.db.begin().await?;
    let model = services::institution::create_institution(&txn, payload).await?;
    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(
            InstitutionResponse::from(model),
            "Institution created successfully",
        ),
    ))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Institutions",
    operation_id = "updateInstitution",
    summary = "Update an institution",
    description = "Requires `ADMIN`, or `INSTITUTION_ADMIN` of this institution. `settings` and \
        `socialMedia` are only replaced when present.",
    params(("id" = i32, Path, description = "Institution ID")),
    request_body = InstitutionRequest,
    responses(
        (status = 200, description = "Institution updated", body = ApiResponse<InstitutionResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Institution not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_institution(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<InstitutionRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.authorize(Some(id), Action::ManageInstitution)?;
    validate_institution_request(&payload)?;

    let txn = state.db.begin().await?;
    let model = services::institution::update_institution(&txn, id, payload).await?;
    txn.commit().await?;

    Ok(ApiResponse::with_message(
        InstitutionResponse::from(model),
        "Institution updated successfully",
    ))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Institutions",
    operation_id = "deleteInstitution",
    summary = "Delete an institution",
    description = "Requires `ADMIN`. Deletes the institution's courses with their content and \
        enrollments, detaches its members and makes its challenges platform-wide.",
    params(("id" = i32, Path, description = "Institution ID")),
    responses(
        (status = 200, description = "Institution deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Institution not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_institution(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.authorize(Some(id), Action::DeleteInstitution)?;

    let txn = state.db.begin().await?;
    services::institution::delete_institution(&txn, id).await?;
    txn.commit().await?;

    Ok(MessageResponse::new("Institution deleted successfully"))
}

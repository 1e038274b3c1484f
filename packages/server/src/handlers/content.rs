//! Per-item management of course materials, videos and questions.

use axum::extract::State;
use axum::response::IntoResponse;
use sea_orm::{ConnectionTrait, TransactionTrait};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppPath};
use crate::models::course::{
    CourseResponse, MaterialRequest, QuestionRequest, VideoRequest, validate_material,
    validate_question, validate_video,
};
use crate::models::shared::ApiResponse;
use crate::policy::Action;
use crate::services;
use crate::state::AppState;

async fn authorize_course<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    course_id: i32,
) -> Result<(), AppError> {
    let course = services::course::find_course(db, course_id).await?;
    auth_user.authorize(Some(course.institution_id), Action::ManageCourse)
}

#[utoipa::path(
    post,
    path = "/{id}/materials",
    tag = "Course Content",
    operation_id = "addMaterial",
    summary = "Add a material to a course",
    params(("id" = i32, Path, description = "Course ID")),
    request_body = MaterialRequest,
    responses(
        (status = 200, description = "Material added; returns the course", body = ApiResponse<CourseResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn add_material(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(course_id): AppPath<i32>,
    AppJson(payload): AppJson<MaterialRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_material(&payload)?;

    let txn = state.db.begin().await?;
    authorize_course(&txn, &auth_user, course_id).await?;
    let course = services::course::add_material(&txn, course_id, payload).await?;
    txn.commit().await?;

    Ok(ApiResponse::with_message(
        CourseResponse::from(course),
        "Material added to course successfully",
    ))
}

#[utoipa::path(
    put,
    path = "/{id}/materials/{material_id}",
    tag = "Course Content",
    operation_id = "updateMaterial",
    summary = "Update a course material",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("material_id" = i32, Path, description = "Material ID"),
    ),
    request_body = MaterialRequest,
    responses(
        (status = 200, description = "Material updated; returns the course", body = ApiResponse<CourseResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course or material not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_material(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath((course_id, material_id)): AppPath<(i32, i32)>,
    AppJson(payload): AppJson<MaterialRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_material(&payload)?;

    let txn = state.db.begin().await?;
    authorize_course(&txn, &auth_user, course_id).await?;
    let course =
        services::course::update_material(&txn, course_id, material_id, payload).await?;
    txn.commit().await?;

    Ok(ApiResponse::with_message(
        CourseResponse::from(course),
        "Material updated successfully",
    ))
}

#[utoipa::path(
    delete,
    path = "/{id}/materials/{material_id}",
    tag = "Course Content",
    operation_id = "removeMaterial",
    summary = "Remove a material from a course",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("material_id" = i32, Path, description = "Material ID"),
    ),
    responses(
        (status = 200, description = "Material removed; returns the course", body = ApiResponse<CourseResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course or material not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn remove_material(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath((course_id, material_id)): AppPath<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    authorize_course(&txn, &auth_user, course_id).await?;
    let course = services::course::remove_material(&txn, course_id, material_id).await?;
    txn.commit().await?;

    Ok(ApiResponse::with_message(
        CourseResponse::from(course),
        "Material removed from course successfully",
    ))
}

#[utoipa::path(
    post,
    path = "/{id}/videos",
    tag = "Course Content",
    operation_id = "addVideo",
    summary = "Add a video to a course",
    params(("id" = i32, Path, description = "Course ID")),
    request_body = VideoRequest,
    responses(
        (status = 200, description = "Video added; returns the course", body = ApiResponse<CourseResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn add_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(course_id): AppPath<i32>,
    AppJson(payload): AppJson<VideoRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_video(&payload)?;

    let txn = state.db.begin().await?;
    authorize_course(&txn, &auth_user, course_id).await?;
    let course = services::course::add_video(&txn, course_id, payload).await?;
    txn.commit().await?;

    Ok(ApiResponse::with_message(
        CourseResponse::from(course),
        "Video added to course successfully",
    ))
}

#[utoipa::path(
    put,
    path = "/{id}/videos/{video_id}",
    tag = "Course Content",
    operation_id = "updateVideo",
    summary = "Update a course video",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("video_id" = i32, Path, description = "Video ID"),
    ),
    request_body = VideoRequest,
    responses(
        (status = 200, description = "Video updated; returns the course", body = ApiResponse<CourseResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course or video not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath((course_id, video_id)): AppPath<(i32, i32)>,
    AppJson(payload): AppJson<VideoRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_video(&payload)?;

    let txn = state.db.begin().await?;
    authorize_course(&txn, &auth_user, course_id).await?;
    let course = services::course::update_video(&txn, course_id, video_id, payload).await?;
    txn.commit().await?;

    Ok(ApiResponse::with_message(
        CourseResponse::from(course),
        "Video updated successfully",
    ))
}

#[utoipa::path(
    delete,
    path = "/{id}/videos/{video_id}",
    tag = "Course Content",
    operation_id = "removeVideo",
    summary = "Remove a video from a course",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("video_id" = i32, Path, description = "Video ID"),
    ),
    responses(
        (status = 200, description = "Video removed; returns the course", body = ApiResponse<CourseResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course or video not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn remove_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath((course_id, video_id)): AppPath<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    authorize_course(&txn, &auth_user, course_id).await?;
    let course = services::course::remove_video(&txn, course_id, video_id).await?;
    txn.commit().await?;

    Ok(ApiResponse::with_message(
        CourseResponse::from(course),
        "Video removed from course successfully",
    ))
}

#[utoipa::path(
    post,
    path = "/{id}/questions",
    tag = "Course Content",
    operation_id = "addQuestion",
    summary = "Add a quiz question to a course",
    params(("id" = i32, Path, description = "Course ID")),
    request_body = QuestionRequest,
    responses(
        (status = 200, description = "Question added; returns the course", body = ApiResponse<CourseResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn add_question(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(course_id): AppPath<i32>,
    AppJson(payload): AppJson<QuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_question(&payload)?;

    let txn = state.db.begin().await?;
    authorize_course(&txn, &auth_user, course_id).await?;
    let course = services::course::add_question(&txn, course_id, payload).await?;
    txn.commit().await?;

    Ok(ApiResponse::with_message(
        CourseResponse::from(course),
        "Question added to course successfully",
    ))
}

#[utoipa::path(
    put,
    path = "/{id}/questions/{question_id}",
    tag = "Course Content",
    operation_id = "updateQuestion",
    summary = "Update a quiz question",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("question_id" = i32, Path, description = "Question ID"),
    ),
    request_body = QuestionRequest,
    responses(
        (status = 200, description = "Question updated; returns the course", body = ApiResponse<CourseResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course or question not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_question(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath((course_id, question_id)): AppPath<(i32, i32)>,
    AppJson(payload): AppJson<QuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_question(&payload)?;

    let txn = state.db.begin().await?;
    authorize_course(&txn, &auth_user, course_id).await?;
    let course =
        services::course::update_question(&txn, course_id, question_id, payload).await?;
    txn.commit().await?;

    Ok(ApiResponse::with_message(
        CourseResponse::from(course),
        "Question updated successfully",
    ))
}

#[utoipa::path(
    delete,
    path = "/{id}/questions/{question_id}",
    tag = "Course Content",
    operation_id = "removeQuestion",
    summary = "Remove a quiz question from a course",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("question_id" = i32, Path, description = "Question ID"),
    ),
    responses(
        (status = 200, description = "Question removed; returns the course", body = ApiResponse<CourseResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course or question not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn remove_question(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath((course_id, question_id)): AppPath<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    authorize_course(&txn, &auth_user, course_id).await?;
    let course = services::course::remove_question(&txn, course_id, question_id).await?;
    txn.commit().await?;

    Ok(ApiResponse::with_message(
        CourseResponse::from(course),
        "Question removed from course successfully",
    ))
}

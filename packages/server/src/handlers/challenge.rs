use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{ChallengeStatus, ChallengeType};
use sea_orm::TransactionTrait;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppPath};
use crate::models::challenge::{
    ChallengeAggregate, ChallengeRequest, ChallengeResponse, ParticipantResponse,
    validate_challenge_request,
};
use crate::models::shared::{ApiResponse, MessageResponse};
use crate::policy::Action;
use crate::services;
use crate::state::AppState;

fn to_responses(challenges: Vec<ChallengeAggregate>) -> Vec<ChallengeResponse> {
    challenges.into_iter().map(ChallengeResponse::from).collect()
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Challenges",
    operation_id = "listChallenges",
    summary = "List challenges",
    responses(
        (status = 200, description = "Challenges", body = ApiResponse<Vec<ChallengeResponse>>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_challenges(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let challenges = services::challenge::list_challenges(&state.db).await?;
    Ok(ApiResponse::ok(to_responses(challenges)))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Challenges",
    operation_id = "getChallenge",
    summary = "Get a challenge by ID",
    params(("id" = i32, Path, description = "Challenge ID")),
    responses(
        (status = 200, description = "Challenge", body = ApiResponse<ChallengeResponse>),
        (status = 404, description = "Challenge not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_challenge(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    let challenge = services::challenge::get_challenge(&state.db, id).await?;
    Ok(ApiResponse::ok(ChallengeResponse::from(challenge)))
}

#[utoipa::path(
    get,
    path = "/family/{family_id}",
    tag = "Challenges",
    operation_id = "listChallengesByFamily",
    summary = "List the challenges of a family",
    params(("family_id" = i32, Path, description = "Family ID")),
    responses(
        (status = 200, description = "Challenges", body = ApiResponse<Vec<ChallengeResponse>>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_challenges_by_family(
    State(state): State<AppState>,
    AppPath(family_id): AppPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    let challenges = services::challenge::list_by_family(&state.db, family_id).await?;
    Ok(ApiResponse::ok(to_responses(challenges)))
}

#[utoipa::path(
    get,
    path = "/status/{status}",
    tag = "Challenges",
    operation_id = "listChallengesByStatus",
    summary = "List challenges by status",
    params(("status" = ChallengeStatus, Path, description = "`ACTIVE`, `INACTIVE` or `COMPLETED` (case-insensitive)")),
    responses(
        (status = 200, description = "Challenges", body = ApiResponse<Vec<ChallengeResponse>>),
        (status = 400, description = "Unknown status (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_challenges_by_status(
    State(state): State<AppState>,
    AppPath(status): AppPath<String>,
) -> Result<impl IntoResponse, AppError> {
    let status: ChallengeStatus = status.parse()?;
    let challenges = services::challenge::list_by_status(&state.db, status).await?;
    Ok(ApiResponse::ok(to_responses(challenges)))
}

#[utoipa::path(
    get,
    path = "/type/{type}",
    tag = "Challenges",
    operation_id = "listChallengesByType",
    summary = "List challenges by type",
    params(("type" = ChallengeType, Path, description = "Challenge type (case-insensitive)")),
    responses(
        (status = 200, description = "Challenges", body = ApiResponse<Vec<ChallengeResponse>>),
        (status = 400, description = "Unknown type (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_challenges_by_type(
    State(state): State<AppState>,
    AppPath(challenge_type): AppPath<String>,
) -> Result<impl IntoResponse, AppError> {
    let challenge_type: ChallengeType = challenge_type.parse()?;
    let challenges = services::challenge::list_by_type(&state.db, challenge_type).await?;
    Ok(ApiResponse::ok(to_responses(challenges)))
}

#[utoipa::path(
    get,
    path = "/{id}/participants",
    tag = "Challenges",
    operation_id = "listChallengeParticipants",
    summary = "List the participants of a challenge",
    params(("id" = i32, Path, description = "Challenge ID")),
    responses(
        (status = 200, description = "Participants", body = ApiResponse<Vec<ParticipantResponse>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Challenge not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_participants(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    let participants = services::challenge::list_participants(&state.db, id).await?;
    Ok(ApiResponse::ok(participants))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Challenges",
    operation_id = "createChallenge",
    summary = "Create a challenge",
    description = "Any signed-in user may create a platform-wide challenge. Scoping it to an \
        institution requires membership of that institution (or `ADMIN`).",
    request_body = ChallengeRequest,
    responses(
        (status = 201, description = "Challenge created", body = ApiResponse<ChallengeResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_challenge(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ChallengeRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.institution_id.is_some() {
        auth_user.authorize(payload.institution_id, Action::ManageChallenge)?;
    }
    validate_challenge_request(&payload)?;

    let txn = state.db.begin().await?;
    let challenge = services::challenge::create_challenge(&txn, payload).await?;
    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(
            ChallengeResponse::from(challenge),
            "Challenge created successfully",
        ),
    ))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Challenges",
    operation_id = "updateChallenge",
    summary = "Update a challenge",
    description = "Requires `ADMIN`, or institution staff when the challenge is scoped to their \
        institution.",
    params(("id" = i32, Path, description = "Challenge ID")),
    request_body = ChallengeRequest,
    responses(
        (status = 200, description = "Challenge updated", body = ApiResponse<ChallengeResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Challenge not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_challenge(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<ChallengeRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_challenge_request(&payload)?;

    let txn = state.db.begin().await?;
    let existing = services::challenge::find_challenge(&txn, id).await?;
    auth_user.authorize(existing.institution_id, Action::ManageChallenge)?;
    if payload.institution_id != existing.institution_id {
        auth_user.authorize(payload.institution_id, Action::ManageChallenge)?;
    }
    let challenge = services::challenge::update_challenge(&txn, id, payload).await?;
    txn.commit().await?;

    Ok(ApiResponse::with_message(
        ChallengeResponse::from(challenge),
        "Challenge updated successfully",
    ))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Challenges",
    operation_id = "deleteChallenge",
    summary = "Delete a challenge",
    params(("id" = i32, Path, description = "Challenge ID")),
    responses(
        (status = 200, description = "Challenge deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Challenge not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_challenge(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    let existing = services::challenge::find_challenge(&txn, id).await?;
    auth_user.authorize(existing.institution_id, Action::ManageChallenge)?;
    services::challenge::delete_challenge(&txn, id).await?;
    txn.commit().await?;

    Ok(MessageResponse::new("Challenge deleted successfully"))
}

#[utoipa::path(
    post,
    path = "/{id}/participate/{user_id}",
    tag = "Challenges",
    operation_id = "participateInChallenge",
    summary = "Join a challenge",
    params(
        ("id" = i32, Path, description = "Challenge ID"),
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "Joined", body = ApiResponse<bool>),
        (status = 400, description = "Already participating (REJECTED)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Challenge or user not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn participate(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath((challenge_id, user_id)): AppPath<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_self_or_admin(user_id)?;

    let txn = state.db.begin().await?;
    let joined = services::challenge::participate(&txn, challenge_id, user_id).await?;
    txn.commit().await?;

    if !joined {
        return Err(AppError::rejected(
            "Failed to join challenge",
            "User may already be participating",
        ));
    }
    Ok(ApiResponse::with_message(true, "Successfully joined the challenge"))
}

#[utoipa::path(
    post,
    path = "/{id}/complete/{user_id}",
    tag = "Challenges",
    operation_id = "completeChallenge",
    summary = "Complete a challenge",
    description = "Records the completion, increments the challenge's check count and awards its \
        score to the user. The user must be participating and not have completed it yet.",
    params(
        ("id" = i32, Path, description = "Challenge ID"),
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "Completed", body = ApiResponse<bool>),
        (status = 400, description = "Not participating or already completed (REJECTED)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Challenge or user not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn complete(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath((challenge_id, user_id)): AppPath<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_self_or_admin(user_id)?;

    let txn = state.db.begin().await?;
    let completed = services::challenge::complete(&txn, challenge_id, user_id).await?;
    txn.commit().await?;

    if !completed {
        return Err(AppError::rejected(
            "Failed to complete challenge",
            "User may not be participating in this challenge",
        ));
    }
    Ok(ApiResponse::with_message(true, "Challenge completed successfully"))
}

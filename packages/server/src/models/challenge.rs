use chrono::{DateTime, Utc};
use common::{ChallengeStatus, ChallengeType};
use serde::{Deserialize, Serialize};

use crate::entity::challenge;
use crate::error::AppError;
use crate::models::shared::{validate_non_negative, validate_required};

/// Request body for creating or replacing a challenge.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequest {
    #[schema(example = "Caminhada Diária")]
    pub title: String,
    #[schema(example = "Faça uma caminhada de pelo menos 30 minutos todos os dias por uma semana")]
    pub description: String,
    #[serde(rename = "type")]
    pub challenge_type: ChallengeType,
    /// Defaults to `ACTIVE`.
    pub status: Option<ChallengeStatus>,
    /// Points awarded on completion.
    #[schema(example = 150)]
    pub score: i32,
    pub image: Option<String>,
    pub image_banner: Option<String>,
    pub family_id: Option<i32>,
    /// Institution the challenge is scoped to; `null` for platform-wide challenges.
    pub institution_id: Option<i32>,
}

pub fn validate_challenge_request(payload: &ChallengeRequest) -> Result<(), AppError> {
    validate_required(&payload.title, "Title", 256)?;
    validate_required(&payload.description, "Description", 2000)?;
    validate_non_negative(Some(payload.score), "Score")
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponse {
    #[schema(example = 1)]
    pub id: i32,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub challenge_type: ChallengeType,
    pub status: ChallengeStatus,
    pub score: i32,
    pub image: Option<String>,
    pub image_banner: Option<String>,
    /// Number of completions so far.
    pub checks: i32,
    pub family_id: Option<i32>,
    pub institution_id: Option<i32>,
    pub participant_ids: Vec<i32>,
    pub completed_by_ids: Vec<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A challenge row with its participant and completion sets.
pub struct ChallengeAggregate {
    pub challenge: challenge::Model,
    pub participant_ids: Vec<i32>,
    pub completed_by_ids: Vec<i32>,
}

impl From<ChallengeAggregate> for ChallengeResponse {
    fn from(agg: ChallengeAggregate) -> Self {
        let c = agg.challenge;
        Self {
            id: c.id,
            title: c.title,
            description: c.description,
            challenge_type: c.challenge_type,
            status: c.status,
            score: c.score,
            image: c.image,
            image_banner: c.image_banner,
            checks: c.checks,
            family_id: c.family_id,
            institution_id: c.institution_id,
            participant_ids: agg.participant_ids,
            completed_by_ids: agg.completed_by_ids,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Participant of a challenge.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantResponse {
    pub user_id: i32,
    pub name: String,
    pub joined_at: DateTime<Utc>,
    /// Set once the participant has completed the challenge.
    pub completed_at: Option<DateTime<Utc>>,
}

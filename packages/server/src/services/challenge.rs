use std::collections::HashMap;

use chrono::Utc;
use common::{ChallengeStatus, ChallengeType};
use sea_orm::prelude::Expr;
use sea_orm::*;
use tracing::{debug, info};

use crate::entity::{challenge, challenge_completion, challenge_participant, user};
use crate::error::AppError;
use crate::models::challenge::{ChallengeAggregate, ChallengeRequest, ParticipantResponse};
use crate::models::shared::trim_opt;

pub async fn find_challenge<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<challenge::Model, AppError> {
    challenge::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Challenge not found with id: {id}")))
}

async fn aggregate<C: ConnectionTrait>(
    db: &C,
    challenges: Vec<challenge::Model>,
) -> Result<Vec<ChallengeAggregate>, AppError> {
    let ids: Vec<i32> = challenges.iter().map(|c| c.id).collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut participants: HashMap<i32, Vec<i32>> = HashMap::new();
    for p in challenge_participant::Entity::find()
        .filter(challenge_participant::Column::ChallengeId.is_in(ids.clone()))
        .order_by_asc(challenge_participant::Column::JoinedAt)
        .all(db)
        .await?
    {
        participants.entry(p.challenge_id).or_default().push(p.user_id);
    }

    let mut completions: HashMap<i32, Vec<i32>> = HashMap::new();
    for c in challenge_completion::Entity::find()
        .filter(challenge_completion::Column::ChallengeId.is_in(ids))
        .order_by_asc(challenge_completion::Column::CompletedAt)
        .all(db)
        .await?
    {
        completions.entry(c.challenge_id).or_default().push(c.user_id);
    }

    Ok(challenges
        .into_iter()
        .map(|challenge| ChallengeAggregate {
            participant_ids: participants.remove(&challenge.id).unwrap_or_default(),
            completed_by_ids: completions.remove(&challenge.id).unwrap_or_default(),
            challenge,
        })
        .collect())
}

async fn list_where<C: ConnectionTrait>(
    db: &C,
    select: Select<challenge::Entity>,
) -> Result<Vec<ChallengeAggregate>, AppError> {
    let challenges = select.order_by_asc(challenge::Column::Id).all(db).await?;
    aggregate(db, challenges).await
}

pub async fn get_challenge<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<ChallengeAggregate, AppError> {
    let challenge = find_challenge(db, id).await?;
    aggregate(db, vec![challenge])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal(format!("Challenge {id} vanished while loading")))
}

pub async fn list_challenges<C: ConnectionTrait>(
    db: &C,
) -> Result<Vec<ChallengeAggregate>, AppError> {
    list_where(db, challenge::Entity::find()).await
}

pub async fn list_by_family<C: ConnectionTrait>(
    db: &C,
    family_id: i32,
) -> Result<Vec<ChallengeAggregate>, AppError> {
    list_where(
        db,
        challenge::Entity::find().filter(challenge::Column::FamilyId.eq(family_id)),
    )
    .await
}

pub async fn list_by_status<C: ConnectionTrait>(
    db: &C,
    status: ChallengeStatus,
) -> Result<Vec<ChallengeAggregate>, AppError> {
    list_where(
        db,
        challenge::Entity::find().filter(challenge::Column::Status.eq(status)),
    )
    .await
}

pub async fn list_by_type<C: ConnectionTrait>(
    db: &C,
    challenge_type: ChallengeType,
) -> Result<Vec<ChallengeAggregate>, AppError> {
    list_where(
        db,
        challenge::Entity::find().filter(challenge::Column::ChallengeType.eq(challenge_type)),
    )
    .await
}

/// New challenges start with no completions; status defaults to `ACTIVE`.
pub async fn create_challenge<C: ConnectionTrait>(
    db: &C,
    input: ChallengeRequest,
) -> Result<ChallengeAggregate, AppError> {
    let now = Utc::now();
    let model = challenge::ActiveModel {
        title: Set(input.title.trim().to_string()),
        description: Set(input.description.trim().to_string()),
        challenge_type: Set(input.challenge_type),
        status: Set(input.status.unwrap_or_default()),
        score: Set(input.score),
        image: Set(trim_opt(input.image)),
        image_banner: Set(trim_opt(input.image_banner)),
        checks: Set(0),
        family_id: Set(input.family_id),
        institution_id: Set(input.institution_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(challenge_id = model.id, "Challenge created");
    Ok(ChallengeAggregate {
        challenge: model,
        participant_ids: Vec::new(),
        completed_by_ids: Vec::new(),
    })
}

/// Replace the editable fields. `checks` and the participant sets are kept.
pub async fn update_challenge<C: ConnectionTrait>(
    db: &C,
    id: i32,
    input: ChallengeRequest,
) -> Result<ChallengeAggregate, AppError> {
    let existing = find_challenge(db, id).await?;
    let mut active: challenge::ActiveModel = existing.into();
    active.title = Set(input.title.trim().to_string());
    active.description = Set(input.description.trim().to_string());
    active.challenge_type = Set(input.challenge_type);
    if let Some(status) = input.status {
        active.status = Set(status);
    }
    active.score = Set(input.score);
    active.image = Set(trim_opt(input.image));
    active.image_banner = Set(trim_opt(input.image_banner));
    active.family_id = Set(input.family_id);
    active.institution_id = Set(input.institution_id);
    active.updated_at = Set(Utc::now());
    active.update(db).await?;

    get_challenge(db, id).await
}

pub async fn delete_challenge<C: ConnectionTrait>(db: &C, id: i32) -> Result<(), AppError> {
    find_challenge(db, id).await?;

    challenge_participant::Entity::delete_many()
        .filter(challenge_participant::Column::ChallengeId.eq(id))
        .exec(db)
        .await?;
    challenge_completion::Entity::delete_many()
        .filter(challenge_completion::Column::ChallengeId.eq(id))
        .exec(db)
        .await?;
    challenge::Entity::delete_by_id(id).exec(db).await?;

    info!(challenge_id = id, "Challenge deleted");
    Ok(())
}

async fn ensure_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<(), AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User not found with id: {id}")))?;
    Ok(())
}

/// Join a challenge. Returns `Ok(false)` when the user already participates.
pub async fn participate<C: ConnectionTrait>(
    db: &C,
    challenge_id: i32,
    user_id: i32,
) -> Result<bool, AppError> {
    find_challenge(db, challenge_id).await?;
    ensure_user(db, user_id).await?;

    let joined = challenge_participant::Entity::find_by_id((challenge_id, user_id))
        .one(db)
        .await?
        .is_some();
    if joined {
        debug!(challenge_id, user_id, "Already participating");
        return Ok(false);
    }

    let participant = challenge_participant::ActiveModel {
        challenge_id: Set(challenge_id),
        user_id: Set(user_id),
        joined_at: Set(Utc::now()),
    };
    match challenge_participant::Entity::insert(participant)
        .exec_without_returning(db)
        .await
    {
        Ok(_) => {
            info!(challenge_id, user_id, "User joined challenge");
            Ok(true)
        }
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Record a completion and award the challenge score.
///
/// Returns `Ok(false)` when the user is not a participant or has already
/// completed the challenge.
pub async fn complete<C: ConnectionTrait>(
    db: &C,
    challenge_id: i32,
    user_id: i32,
) -> Result<bool, AppError> {
    let challenge = find_challenge(db, challenge_id).await?;
    ensure_user(db, user_id).await?;

    let participating = challenge_participant::Entity::find_by_id((challenge_id, user_id))
        .one(db)
        .await?
        .is_some();
    if !participating {
        debug!(challenge_id, user_id, "Not a participant");
        return Ok(false);
    }

    let completion = challenge_completion::ActiveModel {
        challenge_id: Set(challenge_id),
        user_id: Set(user_id),
        completed_at: Set(Utc::now()),
    };
    match challenge_completion::Entity::insert(completion)
        .exec_without_returning(db)
        .await
    {
        Ok(_) => {}
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            debug!(challenge_id, user_id, "Already completed");
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    }

    challenge::Entity::update_many()
        .col_expr(challenge::Column::Checks, Expr::col(challenge::Column::Checks).add(1))
        .col_expr(challenge::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(challenge::Column::Id.eq(challenge_id))
        .exec(db)
        .await?;
    user::Entity::update_many()
        .col_expr(
            user::Column::Score,
            Expr::col(user::Column::Score).add(challenge.score),
        )
        .filter(user::Column::Id.eq(user_id))
        .exec(db)
        .await?;

    info!(challenge_id, user_id, score = challenge.score, "Challenge completed");
    Ok(true)
}

pub async fn list_participants<C: ConnectionTrait>(
    db: &C,
    challenge_id: i32,
) -> Result<Vec<ParticipantResponse>, AppError> {
    find_challenge(db, challenge_id).await?;

    let participants = challenge_participant::Entity::find()
        .filter(challenge_participant::Column::ChallengeId.eq(challenge_id))
        .order_by_asc(challenge_participant::Column::JoinedAt)
        .all(db)
        .await?;
    let completed: HashMap<i32, _> = challenge_completion::Entity::find()
        .filter(challenge_completion::Column::ChallengeId.eq(challenge_id))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.user_id, c.completed_at))
        .collect();

    let user_ids: Vec<i32> = participants.iter().map(|p| p.user_id).collect();
    let names: HashMap<i32, String> = user::Entity::find()
        .filter(user::Column::Id.is_in(user_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u.name))
        .collect();

    Ok(participants
        .into_iter()
        .filter_map(|p| {
            names.get(&p.user_id).map(|name| ParticipantResponse {
                user_id: p.user_id,
                name: name.clone(),
                joined_at: p.joined_at,
                completed_at: completed.get(&p.user_id).copied(),
            })
        })
        .collect())
}

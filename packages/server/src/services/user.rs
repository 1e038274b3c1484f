use std::collections::HashMap;

use chrono::Utc;
use common::Role;
use sea_orm::*;
use tracing::{debug, info};

use crate::entity::{
    challenge_completion, challenge_participant, course_enrollment, institution, user,
};
use crate::error::AppError;
use crate::models::auth::{LoginRequest, RegisterRequest};
use crate::models::shared::trim_opt;
use crate::models::user::{CreateUserRequest, UpdateUserRequest, UserProfile};
use crate::utils::hash;

pub async fn find_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User not found with id: {id}")))
}

async fn ensure_institution<C: ConnectionTrait>(
    db: &C,
    institution_id: Option<i32>,
) -> Result<(), AppError> {
    if let Some(id) = institution_id {
        institution::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Institution not found with id: {id}")))?;
    }
    Ok(())
}

fn map_email_conflict(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            debug!("Unique constraint caught on user email");
            AppError::EmailTaken
        }
        _ => AppError::from(e),
    }
}

/// Emails are stored and looked up in lowercase.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_password(password: &str) -> Result<String, AppError> {
    hash::hash_password(password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))
}

/// Attach link ids to each user with one query per link table.
async fn profiles<C: ConnectionTrait>(
    db: &C,
    users: Vec<user::Model>,
) -> Result<Vec<UserProfile>, AppError> {
    let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut courses: HashMap<i32, Vec<i32>> = HashMap::new();
    for e in course_enrollment::Entity::find()
        .filter(course_enrollment::Column::UserId.is_in(ids.clone()))
        .order_by_asc(course_enrollment::Column::EnrolledAt)
        .all(db)
        .await?
    {
        courses.entry(e.user_id).or_default().push(e.course_id);
    }

    let mut participating: HashMap<i32, Vec<i32>> = HashMap::new();
    for p in challenge_participant::Entity::find()
        .filter(challenge_participant::Column::UserId.is_in(ids.clone()))
        .order_by_asc(challenge_participant::Column::JoinedAt)
        .all(db)
        .await?
    {
        participating.entry(p.user_id).or_default().push(p.challenge_id);
    }

    let mut completed: HashMap<i32, Vec<i32>> = HashMap::new();
    for c in challenge_completion::Entity::find()
        .filter(challenge_completion::Column::UserId.is_in(ids))
        .order_by_asc(challenge_completion::Column::CompletedAt)
        .all(db)
        .await?
    {
        completed.entry(c.user_id).or_default().push(c.challenge_id);
    }

    Ok(users
        .into_iter()
        .map(|user| UserProfile {
            enrolled_course_ids: courses.remove(&user.id).unwrap_or_default(),
            participating_challenge_ids: participating.remove(&user.id).unwrap_or_default(),
            completed_challenge_ids: completed.remove(&user.id).unwrap_or_default(),
            user,
        })
        .collect())
}

pub async fn get_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<UserProfile, AppError> {
    let user = find_user(db, id).await?;
    profiles(db, vec![user])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal(format!("User {id} vanished while loading")))
}

pub async fn list_users<C: ConnectionTrait>(db: &C) -> Result<Vec<UserProfile>, AppError> {
    let users = user::Entity::find()
        .order_by_asc(user::Column::Id)
        .all(db)
        .await?;
    profiles(db, users).await
}

pub async fn list_by_institution<C: ConnectionTrait>(
    db: &C,
    institution_id: i32,
) -> Result<Vec<UserProfile>, AppError> {
    let users = user::Entity::find()
        .filter(user::Column::InstitutionId.eq(institution_id))
        .order_by_asc(user::Column::Id)
        .all(db)
        .await?;
    profiles(db, users).await
}

struct NewUser {
    name: String,
    email: String,
    password: String,
    role: Role,
    institution_id: Option<i32>,
    phone: Option<String>,
    avatar: Option<String>,
}

async fn insert_user<C: ConnectionTrait>(db: &C, new: NewUser) -> Result<user::Model, AppError> {
    ensure_institution(db, new.institution_id).await?;

    let now = Utc::now();
    let model = user::ActiveModel {
        name: Set(new.name.trim().to_string()),
        email: Set(normalize_email(&new.email)),
        password: Set(hash_password(&new.password)?),
        role: Set(new.role),
        institution_id: Set(new.institution_id),
        phone: Set(trim_opt(new.phone)),
        avatar: Set(trim_opt(new.avatar)),
        score: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(map_email_conflict)?;

    info!(user_id = model.id, role = %model.role, "User created");
    Ok(model)
}

pub async fn create_user<C: ConnectionTrait>(
    db: &C,
    input: CreateUserRequest,
) -> Result<UserProfile, AppError> {
    let model = insert_user(
        db,
        NewUser {
            name: input.name,
            email: input.email,
            password: input.password,
            role: input.role.unwrap_or_default(),
            institution_id: input.institution_id,
            phone: input.phone,
            avatar: input.avatar,
        },
    )
    .await?;
    get_user(db, model.id).await
}

/// Self sign-up. The requested role is only honoured when `privileged`.
pub async fn register<C: ConnectionTrait>(
    db: &C,
    input: RegisterRequest,
    privileged: bool,
) -> Result<user::Model, AppError> {
    let role = if privileged {
        input.role.unwrap_or_default()
    } else {
        Role::User
    };
    insert_user(
        db,
        NewUser {
            name: input.name,
            email: input.email,
            password: input.password,
            role,
            institution_id: input.institution_id,
            phone: input.phone,
            avatar: None,
        },
    )
    .await
}

/// Check credentials. Unknown e-mail and wrong password are indistinguishable.
pub async fn authenticate<C: ConnectionTrait>(
    db: &C,
    input: &LoginRequest,
) -> Result<user::Model, AppError> {
    let user = user::Entity::find()
        .filter(user::Column::Email.eq(normalize_email(&input.email)))
        .one(db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&input.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {e}")))?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }
    Ok(user)
}

/// Update a profile. `role` and `institution_id` are applied only when
/// `privileged`; otherwise they are ignored. An explicit `null` institution
/// detaches the user.
pub async fn update_user<C: ConnectionTrait>(
    db: &C,
    id: i32,
    input: UpdateUserRequest,
    privileged: bool,
) -> Result<UserProfile, AppError> {
    let existing = find_user(db, id).await?;
    let mut active: user::ActiveModel = existing.into();
    active.name = Set(input.name.trim().to_string());
    active.email = Set(normalize_email(&input.email));
    active.phone = Set(trim_opt(input.phone));
    active.avatar = Set(trim_opt(input.avatar));
    if let Some(password) = &input.password {
        active.password = Set(hash_password(password)?);
    }
    if privileged {
        if let Some(role) = input.role {
            active.role = Set(role);
        }
        if let Some(institution_id) = input.institution_id {
            ensure_institution(db, institution_id).await?;
            active.institution_id = Set(institution_id);
        }
    }
    active.updated_at = Set(Utc::now());
    active.update(db).await.map_err(map_email_conflict)?;

    get_user(db, id).await
}

/// Delete a user and every enrollment, participation and completion row.
pub async fn delete_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<(), AppError> {
    find_user(db, id).await?;

    course_enrollment::Entity::delete_many()
        .filter(course_enrollment::Column::UserId.eq(id))
        .exec(db)
        .await?;
    challenge_participant::Entity::delete_many()
        .filter(challenge_participant::Column::UserId.eq(id))
        .exec(db)
        .await?;
    challenge_completion::Entity::delete_many()
        .filter(challenge_completion::Column::UserId.eq(id))
        .exec(db)
        .await?;
    user::Entity::delete_by_id(id).exec(db).await?;

    info!(user_id = id, "User deleted");
    Ok(())
}

use chrono::Utc;
use common::InstitutionStatus;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::info;

use crate::entity::{challenge, institution, institution_course, user};
use crate::error::AppError;
use crate::models::institution::{InstitutionRequest, InstitutionSettings, SocialMedia};
use crate::models::shared::{escape_like, trim_opt};
use crate::services::course::delete_courses_where;

pub async fn find_institution<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<institution::Model, AppError> {
    institution::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Institution not found with id: {id}")))
}

pub async fn list_institutions<C: ConnectionTrait>(
    db: &C,
) -> Result<Vec<institution::Model>, AppError> {
    Ok(institution::Entity::find()
        .order_by_asc(institution::Column::Id)
        .all(db)
        .await?)
}

pub async fn list_by_status<C: ConnectionTrait>(
    db: &C,
    status: InstitutionStatus,
) -> Result<Vec<institution::Model>, AppError> {
    Ok(institution::Entity::find()
        .filter(institution::Column::Status.eq(status))
        .order_by_asc(institution::Column::Id)
        .all(db)
        .await?)
}

/// Institutions whose name contains `query`, ignoring case.
pub async fn search_institutions<C: ConnectionTrait>(
    db: &C,
    query: &str,
) -> Result<Vec<institution::Model>, AppError> {
    let term = escape_like(query.trim()).to_lowercase();
    Ok(institution::Entity::find()
        .filter(
            Expr::expr(Func::lower(Expr::col(institution::Column::Name)))
                .like(LikeExpr::new(format!("%{term}%")).escape('\\')),
        )
        .order_by_asc(institution::Column::Id)
        .all(db)
        .await?)
}

fn apply_settings(active: &mut institution::ActiveModel, settings: InstitutionSettings) {
    active.allow_enrollment = Set(settings.allow_enrollment);
    active.require_approval = Set(settings.require_approval);
    active.max_students_per_course = Set(settings.max_students_per_course);
}

fn apply_social_media(active: &mut institution::ActiveModel, social: SocialMedia) {
    active.website = Set(trim_opt(social.website));
    active.facebook = Set(trim_opt(social.facebook));
    active.instagram = Set(trim_opt(social.instagram));
    active.linkedin = Set(trim_opt(social.linkedin));
}

pub async fn create_institution<C: ConnectionTrait>(
    db: &C,
    input: InstitutionRequest,
) -> Result<institution::Model, AppError> {
    let now = Utc::now();
    let mut active = institution::ActiveModel {
        name: Set(input.name.trim().to_string()),
        email: Set(input.email.trim().to_string()),
        phone: Set(input.phone.trim().to_string()),
        address: Set(trim_opt(input.address)),
        logo: Set(trim_opt(input.logo)),
        description: Set(trim_opt(input.description)),
        status: Set(input.status.unwrap_or_default()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    apply_settings(&mut active, input.settings.unwrap_or_default());
    apply_social_media(&mut active, input.social_media.unwrap_or_default());

    let model = active.insert(db).await?;
    info!(institution_id = model.id, name = %model.name, "Institution created");
    Ok(model)
}

/// Replace scalar fields; settings and social media only when supplied.
pub async fn update_institution<C: ConnectionTrait>(
    db: &C,
    id: i32,
    input: InstitutionRequest,
) -> Result<institution::Model, AppError> {
    let existing = find_institution(db, id).await?;
    let mut active: institution::ActiveModel = existing.into();
    active.name = Set(input.name.trim().to_string());
    active.email = Set(input.email.trim().to_string());
    active.phone = Set(input.phone.trim().to_string());
    active.address = Set(trim_opt(input.address));
    active.logo = Set(trim_opt(input.logo));
    active.description = Set(trim_opt(input.description));
    if let Some(status) = input.status {
        active.status = Set(status);
    }
    if let Some(settings) = input.settings {
        apply_settings(&mut active, settings);
    }
    if let Some(social) = input.social_media {
        apply_social_media(&mut active, social);
    }
    active.updated_at = Set(Utc::now());

    Ok(active.update(db).await?)
}

/// Delete an institution together with its courses. Members are detached and
/// scoped challenges become platform-wide.
pub async fn delete_institution<C: ConnectionTrait>(db: &C, id: i32) -> Result<(), AppError> {
    find_institution(db, id).await?;

    let courses =
        delete_courses_where(db, institution_course::Column::InstitutionId.eq(id)).await?;
    let detached = user::Entity::update_many()
        .col_expr(user::Column::InstitutionId, Expr::value(Option::<i32>::None))
        .filter(user::Column::InstitutionId.eq(id))
        .exec(db)
        .await?;
    challenge::Entity::update_many()
        .col_expr(challenge::Column::InstitutionId, Expr::value(Option::<i32>::None))
        .filter(challenge::Column::InstitutionId.eq(id))
        .exec(db)
        .await?;
    institution::Entity::delete_by_id(id).exec(db).await?;

    info!(
        institution_id = id,
        courses,
        users_detached = detached.rows_affected,
        "Institution deleted"
    );
    Ok(())
}

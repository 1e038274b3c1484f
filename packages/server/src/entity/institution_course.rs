use common::CourseStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "institution_course")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub image: Option<String>,
    pub status: CourseStatus,

    // Settings
    pub allow_enrollment: bool,
    pub require_approval: bool,
    pub max_students: Option<i32>,

    pub institution_id: i32,
    #[sea_orm(belongs_to, from = "institution_id", to = "id")]
    pub institution: HasOne<super::institution::Entity>,

    #[sea_orm(has_many)]
    pub materials: HasMany<super::institution_material::Entity>,
    #[sea_orm(has_many)]
    pub videos: HasMany<super::institution_video::Entity>,
    #[sea_orm(has_many)]
    pub questions: HasMany<super::institution_question::Entity>,

    #[sea_orm(has_many, via = "course_enrollment")]
    pub students: HasMany<super::user::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

use common::Role;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password: String, // Argon2 PHC string
    pub role: Role,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub score: i32,

    pub institution_id: Option<i32>,
    #[sea_orm(belongs_to, from = "institution_id", to = "id")]
    pub institution: HasOne<super::institution::Entity>,

    #[sea_orm(has_many, via = "course_enrollment")]
    pub courses: HasMany<super::institution_course::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

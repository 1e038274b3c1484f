use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "institution_material")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub filename: String,
    #[sea_orm(column_name = "type")]
    pub material_type: String, // e.g. "pdf", "doc"
    pub size: Option<i64>,     // in bytes

    pub course_id: i32,
    #[sea_orm(belongs_to, from = "course_id", to = "id")]
    pub course: HasOne<super::institution_course::Entity>,

    pub uploaded_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

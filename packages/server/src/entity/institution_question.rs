use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "institution_question")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text")]
    pub question: String,
    /// JSON array of answer options.
    #[sea_orm(column_type = "Text")]
    pub alternatives: String,
    pub correct_answer: i32, // index into `alternatives`

    pub course_id: i32,
    #[sea_orm(belongs_to, from = "course_id", to = "id")]
    pub course: HasOne<super::institution_course::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

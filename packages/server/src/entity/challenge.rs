use common::{ChallengeStatus, ChallengeType};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "challenge")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_name = "type")]
    pub challenge_type: ChallengeType,
    pub status: ChallengeStatus,
    pub score: i32,
    pub image: Option<String>,
    pub image_banner: Option<String>,
    pub checks: i32, // number of completions

    pub family_id: Option<i32>,
    pub institution_id: Option<i32>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

use chrono::{DateTime, Utc};
use common::InstitutionStatus;
use serde::{Deserialize, Serialize};

use crate::entity::institution;
use crate::error::AppError;
use crate::models::course::DEFAULT_MAX_STUDENTS;
use crate::models::shared::{validate_email, validate_optional, validate_required};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionSettings {
    #[schema(example = true)]
    pub allow_enrollment: bool,
    #[schema(example = false)]
    pub require_approval: bool,
    /// Default capacity for new courses.
    #[schema(example = 100)]
    pub max_students_per_course: Option<i32>,
}

impl Default for InstitutionSettings {
    fn default() -> Self {
        Self {
            allow_enrollment: true,
            require_approval: false,
            max_students_per_course: Some(DEFAULT_MAX_STUDENTS),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SocialMedia {
    #[schema(example = "https://secretariaeducacao.gov.br")]
    pub website: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub linkedin: Option<String>,
}

/// Request body for creating or updating an institution.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionRequest {
    #[schema(example = "Escola Municipal Recife")]
    pub name: String,
    #[schema(example = "contato@escola.recife.br")]
    pub email: String,
    #[schema(example = "(81) 3355-0000")]
    pub phone: String,
    pub address: Option<String>,
    pub logo: Option<String>,
    pub description: Option<String>,
    /// Defaults to `ACTIVE` on creation; kept when omitted on update.
    pub status: Option<InstitutionStatus>,
    /// Replaced only when present.
    pub settings: Option<InstitutionSettings>,
    /// Replaced only when present.
    pub social_media: Option<SocialMedia>,
}

pub fn validate_institution_request(payload: &InstitutionRequest) -> Result<(), AppError> {
    validate_required(&payload.name, "Name", 256)?;
    validate_email(&payload.email)?;
    validate_required(&payload.phone, "Phone", 32)?;
    validate_optional(payload.description.as_deref(), "Description", 2000)?;
    if let Some(max) = payload
        .settings
        .as_ref()
        .and_then(|s| s.max_students_per_course)
        && max < 1
    {
        return Err(AppError::Validation(
            "maxStudentsPerCourse must be >= 1".into(),
        ));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Secretaria de Educação")]
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub logo: Option<String>,
    pub description: Option<String>,
    pub status: InstitutionStatus,
    pub settings: InstitutionSettings,
    pub social_media: SocialMedia,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<institution::Model> for InstitutionResponse {
    fn from(m: institution::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            phone: m.phone,
            address: m.address,
            logo: m.logo,
            description: m.description,
            status: m.status,
            settings: InstitutionSettings {
                allow_enrollment: m.allow_enrollment,
                require_approval: m.require_approval,
                max_students_per_course: m.max_students_per_course,
            },
            social_media: SocialMedia {
                website: m.website,
                facebook: m.facebook,
                instagram: m.instagram,
                linkedin: m.linkedin,
            },
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

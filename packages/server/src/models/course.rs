use chrono::{DateTime, Utc};
use common::CourseStatus;
use serde::{Deserialize, Serialize};

use crate::entity::{institution_course, institution_material, institution_question, institution_video};
use crate::error::AppError;
use crate::models::shared::{validate_non_negative, validate_optional, validate_required};

pub const DEFAULT_MAX_STUDENTS: i32 = 100;

/// Enrollment settings of a course.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseSettings {
    /// Whether students may enroll at all.
    #[schema(example = true)]
    pub allow_enrollment: bool,
    /// Whether enrollment needs staff approval.
    #[schema(example = false)]
    pub require_approval: bool,
    /// Capacity; `null` means unlimited.
    #[schema(example = 100)]
    pub max_students: Option<i32>,
}

impl Default for CourseSettings {
    fn default() -> Self {
        Self {
            allow_enrollment: true,
            require_approval: false,
            max_students: Some(DEFAULT_MAX_STUDENTS),
        }
    }
}

fn validate_settings(settings: Option<&CourseSettings>) -> Result<(), AppError> {
    if let Some(max) = settings.and_then(|s| s.max_students)
        && max < 1
    {
        return Err(AppError::Validation("maxStudents must be >= 1".into()));
    }
    Ok(())
}

/// Material (document) attached to a course.
#[derive(Clone, Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaterialRequest {
    #[schema(example = "Apostila de frações")]
    pub title: String,
    pub description: Option<String>,
    #[schema(example = "fracoes.pdf")]
    pub filename: String,
    /// Document kind, e.g. `pdf`.
    #[serde(rename = "type")]
    #[schema(example = "pdf")]
    pub material_type: String,
    /// Size in bytes.
    #[schema(example = 204800)]
    pub size: Option<i64>,
}

pub fn validate_material(payload: &MaterialRequest) -> Result<(), AppError> {
    validate_required(&payload.title, "Title", 256)?;
    validate_required(&payload.filename, "Filename", 512)?;
    validate_required(&payload.material_type, "Type", 64)?;
    validate_optional(payload.description.as_deref(), "Description", 2000)?;
    validate_non_negative(payload.size, "Size")
}

#[derive(Clone, Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoRequest {
    #[schema(example = "Introdução às frações")]
    pub title: String,
    pub description: Option<String>,
    #[schema(example = "aula1.mp4")]
    pub filename: String,
    /// Duration in seconds.
    #[schema(example = 600)]
    pub duration: Option<i32>,
    pub thumbnail: Option<String>,
    pub url: Option<String>,
}

pub fn validate_video(payload: &VideoRequest) -> Result<(), AppError> {
    validate_required(&payload.title, "Title", 256)?;
    validate_required(&payload.filename, "Filename", 512)?;
    validate_optional(payload.description.as_deref(), "Description", 2000)?;
    validate_non_negative(payload.duration, "Duration")
}

/// Multiple-choice quiz item.
#[derive(Clone, Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRequest {
    #[schema(example = "Quanto é 1/2 + 1/4?")]
    pub question: String,
    #[schema(example = json!(["3/4", "2/6", "1/8"]))]
    pub alternatives: Vec<String>,
    /// Zero-based index of the right alternative.
    #[schema(example = 0)]
    pub correct_answer: i32,
}

pub fn validate_question(payload: &QuestionRequest) -> Result<(), AppError> {
    validate_required(&payload.question, "Question", 2000)?;
    if payload.alternatives.len() < 2 {
        return Err(AppError::Validation(
            "A question needs at least 2 alternatives".into(),
        ));
    }
    if payload.alternatives.iter().any(|a| a.trim().is_empty()) {
        return Err(AppError::Validation(
            "Alternatives must not be empty".into(),
        ));
    }
    let in_range = usize::try_from(payload.correct_answer)
        .is_ok_and(|idx| idx < payload.alternatives.len());
    if !in_range {
        return Err(AppError::Validation(format!(
            "correctAnswer must be between 0 and {}",
            payload.alternatives.len() - 1
        )));
    }
    Ok(())
}

fn validate_content(
    materials: Option<&[MaterialRequest]>,
    videos: Option<&[VideoRequest]>,
    questions: Option<&[QuestionRequest]>,
) -> Result<(), AppError> {
    for m in materials.unwrap_or_default() {
        validate_material(m)?;
    }
    for v in videos.unwrap_or_default() {
        validate_video(v)?;
    }
    for q in questions.unwrap_or_default() {
        validate_question(q)?;
    }
    Ok(())
}

/// Request body for creating a course, optionally with its initial content.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    /// Owning institution.
    #[schema(example = 1)]
    pub institution_id: i32,
    /// Course name (1-256 characters).
    #[schema(example = "Matemática Básica")]
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    /// Defaults to `DRAFT`.
    pub status: Option<CourseStatus>,
    /// Defaults to enrollment allowed, no approval, 100 students.
    pub settings: Option<CourseSettings>,
    pub materials: Option<Vec<MaterialRequest>>,
    pub videos: Option<Vec<VideoRequest>>,
    pub questions: Option<Vec<QuestionRequest>>,
}

pub fn validate_create_course(payload: &CreateCourseRequest) -> Result<(), AppError> {
    validate_required(&payload.name, "Name", 256)?;
    validate_optional(payload.description.as_deref(), "Description", 2000)?;
    validate_settings(payload.settings.as_ref())?;
    validate_content(
        payload.materials.as_deref(),
        payload.videos.as_deref(),
        payload.questions.as_deref(),
    )
}

/// Request body for updating a course.
///
/// Scalar fields are replaced. Each content list replaces the existing items
/// when present (`[]` clears them) and is left untouched when omitted.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseRequest {
    #[schema(example = "Matemática Básica II")]
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    /// Keeps the current status when omitted.
    pub status: Option<CourseStatus>,
    /// Keeps the current settings when omitted.
    pub settings: Option<CourseSettings>,
    pub materials: Option<Vec<MaterialRequest>>,
    pub videos: Option<Vec<VideoRequest>>,
    pub questions: Option<Vec<QuestionRequest>>,
}

pub fn validate_update_course(payload: &UpdateCourseRequest) -> Result<(), AppError> {
    validate_required(&payload.name, "Name", 256)?;
    validate_optional(payload.description.as_deref(), "Description", 2000)?;
    validate_settings(payload.settings.as_ref())?;
    validate_content(
        payload.materials.as_deref(),
        payload.videos.as_deref(),
        payload.questions.as_deref(),
    )
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaterialResponse {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub filename: String,
    #[serde(rename = "type")]
    pub material_type: String,
    pub size: Option<i64>,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<institution_material::Model> for MaterialResponse {
    fn from(m: institution_material::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            filename: m.filename,
            material_type: m.material_type,
            size: m.size,
            uploaded_at: m.uploaded_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub filename: String,
    pub duration: Option<i32>,
    pub thumbnail: Option<String>,
    pub url: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<institution_video::Model> for VideoResponse {
    fn from(v: institution_video::Model) -> Self {
        Self {
            id: v.id,
            title: v.title,
            description: v.description,
            filename: v.filename,
            duration: v.duration,
            thumbnail: v.thumbnail,
            url: v.url,
            uploaded_at: v.uploaded_at,
            updated_at: v.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    pub id: i32,
    pub question: String,
    pub alternatives: Vec<String>,
    pub correct_answer: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Encode alternatives for the `alternatives` text column.
pub fn encode_alternatives(alternatives: &[String]) -> Result<String, AppError> {
    serde_json::to_string(alternatives)
        .map_err(|e| AppError::Internal(format!("Failed to encode alternatives: {e}")))
}

impl From<institution_question::Model> for QuestionResponse {
    fn from(q: institution_question::Model) -> Self {
        let alternatives = serde_json::from_str(&q.alternatives).unwrap_or_else(|e| {
            tracing::warn!(question_id = q.id, "Unreadable alternatives column: {e}");
            Vec::new()
        });
        Self {
            id: q.id,
            question: q.question,
            alternatives,
            correct_answer: q.correct_answer,
            created_at: q.created_at,
            updated_at: q.updated_at,
        }
    }
}

/// Full course representation, including its content and enrolled students.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse {
    #[schema(example = 12)]
    pub id: i32,
    #[schema(example = 1)]
    pub institution_id: i32,
    #[schema(example = "Matemática Básica")]
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub status: CourseStatus,
    pub settings: CourseSettings,
    pub materials: Vec<MaterialResponse>,
    pub videos: Vec<VideoResponse>,
    pub questions: Vec<QuestionResponse>,
    /// IDs of enrolled students.
    #[schema(example = json!([3, 8]))]
    pub students_enrolled: Vec<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A course row together with its owned rows, as loaded by the course service.
pub struct CourseAggregate {
    pub course: institution_course::Model,
    pub materials: Vec<institution_material::Model>,
    pub videos: Vec<institution_video::Model>,
    pub questions: Vec<institution_question::Model>,
    pub student_ids: Vec<i32>,
}

impl From<CourseAggregate> for CourseResponse {
    fn from(agg: CourseAggregate) -> Self {
        let c = agg.course;
        Self {
            id: c.id,
            institution_id: c.institution_id,
            name: c.name,
            description: c.description,
            image: c.image,
            status: c.status,
            settings: CourseSettings {
                allow_enrollment: c.allow_enrollment,
                require_approval: c.require_approval,
                max_students: c.max_students,
            },
            materials: agg.materials.into_iter().map(Into::into).collect(),
            videos: agg.videos.into_iter().map(Into::into).collect(),
            questions: agg.questions.into_iter().map(Into::into).collect(),
            students_enrolled: agg.student_ids,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Enrolled student as listed for course staff.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledStudent {
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub enrolled_at: DateTime<Utc>,
}

use std::collections::HashMap;

use chrono::Utc;
use common::CourseStatus;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, IntoCondition, LikeExpr};
use sea_orm::*;
use tracing::{debug, info};

use crate::entity::{
    course_enrollment, institution, institution_course, institution_material,
    institution_question, institution_video, user,
};
use crate::error::AppError;
use crate::models::course::{
    CourseAggregate, CourseSettings, CreateCourseRequest, EnrolledStudent, MaterialRequest,
    QuestionRequest, UpdateCourseRequest, VideoRequest, encode_alternatives,
};
use crate::models::shared::{escape_like, trim_opt};

pub async fn find_course<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<institution_course::Model, AppError> {
    institution_course::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Institution course not found with id: {id}")))
}

/// Load a course with its content and enrolled student ids.
pub async fn load_course<C: ConnectionTrait>(db: &C, id: i32) -> Result<CourseAggregate, AppError> {
    let course = find_course(db, id).await?;
    let mut all = aggregate(db, vec![course]).await?;
    all.pop()
        .ok_or_else(|| AppError::Internal(format!("Course {id} vanished while loading")))
}

/// Attach owned rows to each course with one query per child table.
async fn aggregate<C: ConnectionTrait>(
    db: &C,
    courses: Vec<institution_course::Model>,
) -> Result<Vec<CourseAggregate>, AppError> {
    let ids: Vec<i32> = courses.iter().map(|c| c.id).collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut materials = group_by_course(
        institution_material::Entity::find()
            .filter(institution_material::Column::CourseId.is_in(ids.clone()))
            .order_by_asc(institution_material::Column::Id)
            .all(db)
            .await?,
        |m| m.course_id,
    );
    let mut videos = group_by_course(
        institution_video::Entity::find()
            .filter(institution_video::Column::CourseId.is_in(ids.clone()))
            .order_by_asc(institution_video::Column::Id)
            .all(db)
            .await?,
        |v| v.course_id,
    );
    let mut questions = group_by_course(
        institution_question::Entity::find()
            .filter(institution_question::Column::CourseId.is_in(ids.clone()))
            .order_by_asc(institution_question::Column::Id)
            .all(db)
            .await?,
        |q| q.course_id,
    );
    let mut students = group_by_course(
        course_enrollment::Entity::find()
            .filter(course_enrollment::Column::CourseId.is_in(ids))
            .order_by_asc(course_enrollment::Column::EnrolledAt)
            .all(db)
            .await?,
        |e| e.course_id,
    );

    Ok(courses
        .into_iter()
        .map(|course| CourseAggregate {
            materials: materials.remove(&course.id).unwrap_or_default(),
            videos: videos.remove(&course.id).unwrap_or_default(),
            questions: questions.remove(&course.id).unwrap_or_default(),
            student_ids: students
                .remove(&course.id)
                .unwrap_or_default()
                .into_iter()
                .map(|e| e.user_id)
                .collect(),
            course,
        })
        .collect())
}

fn group_by_course<T>(rows: Vec<T>, key: impl Fn(&T) -> i32) -> HashMap<i32, Vec<T>> {
    let mut map: HashMap<i32, Vec<T>> = HashMap::new();
    for row in rows {
        map.entry(key(&row)).or_default().push(row);
    }
    map
}

pub async fn list_courses<C: ConnectionTrait>(db: &C) -> Result<Vec<CourseAggregate>, AppError> {
    let courses = institution_course::Entity::find()
        .order_by_asc(institution_course::Column::Id)
        .all(db)
        .await?;
    aggregate(db, courses).await
}

pub async fn list_by_institution<C: ConnectionTrait>(
    db: &C,
    institution_id: i32,
    status: Option<CourseStatus>,
) -> Result<Vec<CourseAggregate>, AppError> {
    let mut select = institution_course::Entity::find()
        .filter(institution_course::Column::InstitutionId.eq(institution_id));
    if let Some(status) = status {
        select = select.filter(institution_course::Column::Status.eq(status));
    }
    let courses = select
        .order_by_asc(institution_course::Column::Id)
        .all(db)
        .await?;
    aggregate(db, courses).await
}

/// Courses whose name contains `query`, ignoring case.
pub async fn search_courses<C: ConnectionTrait>(
    db: &C,
    query: &str,
) -> Result<Vec<CourseAggregate>, AppError> {
    let term = escape_like(query.trim()).to_lowercase();
    let courses = institution_course::Entity::find()
        .filter(
            Expr::expr(Func::lower(Expr::col(institution_course::Column::Name)))
                .like(LikeExpr::new(format!("%{term}%")).escape('\\')),
        )
        .order_by_asc(institution_course::Column::Id)
        .all(db)
        .await?;
    aggregate(db, courses).await
}

/// Create a course: the header row first, then each supplied content item.
pub async fn create_course<C: ConnectionTrait>(
    db: &C,
    input: CreateCourseRequest,
) -> Result<CourseAggregate, AppError> {
    institution::Entity::find_by_id(input.institution_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Institution not found with id: {}",
                input.institution_id
            ))
        })?;

    let settings = input.settings.unwrap_or_default();
    let now = Utc::now();
    let course = institution_course::ActiveModel {
        institution_id: Set(input.institution_id),
        name: Set(input.name.trim().to_string()),
        description: Set(trim_opt(input.description)),
        image: Set(trim_opt(input.image)),
        status: Set(input.status.unwrap_or_default()),
        allow_enrollment: Set(settings.allow_enrollment),
        require_approval: Set(settings.require_approval),
        max_students: Set(settings.max_students),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    for m in input.materials.unwrap_or_default() {
        insert_material(db, course.id, m).await?;
    }
    for v in input.videos.unwrap_or_default() {
        insert_video(db, course.id, v).await?;
    }
    for q in input.questions.unwrap_or_default() {
        insert_question(db, course.id, q).await?;
    }

    info!(course_id = course.id, institution_id = course.institution_id, "Course created");
    load_course(db, course.id).await
}

pub async fn update_course<C: ConnectionTrait>(
    db: &C,
    id: i32,
    input: UpdateCourseRequest,
) -> Result<CourseAggregate, AppError> {
    let existing = find_course(db, id).await?;
    let mut active: institution_course::ActiveModel = existing.into();

    active.name = Set(input.name.trim().to_string());
    active.description = Set(trim_opt(input.description));
    active.image = Set(trim_opt(input.image));
    if let Some(status) = input.status {
        active.status = Set(status);
    }
    if let Some(CourseSettings {
        allow_enrollment,
        require_approval,
        max_students,
    }) = input.settings
    {
        active.allow_enrollment = Set(allow_enrollment);
        active.require_approval = Set(require_approval);
        active.max_students = Set(max_students);
    }
    active.updated_at = Set(Utc::now());
    active.update(db).await?;

    if let Some(materials) = input.materials {
        institution_material::Entity::delete_many()
            .filter(institution_material::Column::CourseId.eq(id))
            .exec(db)
            .await?;
        for m in materials {
            insert_material(db, id, m).await?;
        }
    }
    if let Some(videos) = input.videos {
        institution_video::Entity::delete_many()
            .filter(institution_video::Column::CourseId.eq(id))
            .exec(db)
            .await?;
        for v in videos {
            insert_video(db, id, v).await?;
        }
    }
    if let Some(questions) = input.questions {
        institution_question::Entity::delete_many()
            .filter(institution_question::Column::CourseId.eq(id))
            .exec(db)
            .await?;
        for q in questions {
            insert_question(db, id, q).await?;
        }
    }

    load_course(db, id).await
}

/// Delete a course with its content and enrollments.
pub async fn delete_course<C: ConnectionTrait>(db: &C, id: i32) -> Result<(), AppError> {
    find_course(db, id).await?;
    delete_courses_where(db, institution_course::Column::Id.eq(id)).await?;
    info!(course_id = id, "Course deleted");
    Ok(())
}

/// Delete every course matching `filter`, children first.
pub(crate) async fn delete_courses_where<C: ConnectionTrait, F: IntoCondition>(
    db: &C,
    filter: F,
) -> Result<u64, AppError> {
    let ids: Vec<i32> = institution_course::Entity::find()
        .filter(filter)
        .all(db)
        .await?
        .into_iter()
        .map(|c| c.id)
        .collect();
    if ids.is_empty() {
        return Ok(0);
    }

    institution_material::Entity::delete_many()
        .filter(institution_material::Column::CourseId.is_in(ids.clone()))
        .exec(db)
        .await?;
    institution_video::Entity::delete_many()
        .filter(institution_video::Column::CourseId.is_in(ids.clone()))
        .exec(db)
        .await?;
    institution_question::Entity::delete_many()
        .filter(institution_question::Column::CourseId.is_in(ids.clone()))
        .exec(db)
        .await?;
    course_enrollment::Entity::delete_many()
        .filter(course_enrollment::Column::CourseId.is_in(ids.clone()))
        .exec(db)
        .await?;
    let res = institution_course::Entity::delete_many()
        .filter(institution_course::Column::Id.is_in(ids))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}

pub async fn set_course_image<C: ConnectionTrait>(
    db: &C,
    id: i32,
    path: String,
) -> Result<CourseAggregate, AppError> {
    let existing = find_course(db, id).await?;
    let mut active: institution_course::ActiveModel = existing.into();
    active.image = Set(Some(path));
    active.updated_at = Set(Utc::now());
    active.update(db).await?;
    load_course(db, id).await
}

async fn find_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User not found with id: {id}")))
}

/// Enroll a student.
///
/// Returns `Ok(false)` when enrollment is disabled, the course is full or the
/// student is already enrolled, checked in that order.
pub async fn enroll_student<C: ConnectionTrait>(
    db: &C,
    course_id: i32,
    user_id: i32,
) -> Result<bool, AppError> {
    let course = find_course(db, course_id).await?;
    find_user(db, user_id).await?;

    if !course.allow_enrollment {
        debug!(course_id, user_id, "Enrollment disabled");
        return Ok(false);
    }

    if let Some(max) = course.max_students {
        let enrolled = course_enrollment::Entity::find()
            .filter(course_enrollment::Column::CourseId.eq(course_id))
            .count(db)
            .await?;
        if enrolled >= u64::try_from(max).unwrap_or(0) {
            debug!(course_id, user_id, enrolled, max, "Course is full");
            return Ok(false);
        }
    }

    let already = course_enrollment::Entity::find_by_id((course_id, user_id))
        .one(db)
        .await?
        .is_some();
    if already {
        debug!(course_id, user_id, "Already enrolled");
        return Ok(false);
    }

    let enrollment = course_enrollment::ActiveModel {
        course_id: Set(course_id),
        user_id: Set(user_id),
        enrolled_at: Set(Utc::now()),
    };
    match course_enrollment::Entity::insert(enrollment)
        .exec_without_returning(db)
        .await
    {
        Ok(_) => {
            info!(course_id, user_id, "Student enrolled");
            Ok(true)
        }
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            debug!(course_id, user_id, "Concurrent duplicate enrollment");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

/// Remove an enrollment. Returns `Ok(false)` when the student was not enrolled.
pub async fn unenroll_student<C: ConnectionTrait>(
    db: &C,
    course_id: i32,
    user_id: i32,
) -> Result<bool, AppError> {
    find_course(db, course_id).await?;
    let res = course_enrollment::Entity::delete_by_id((course_id, user_id))
        .exec(db)
        .await?;
    Ok(res.rows_affected > 0)
}

pub async fn list_enrolled_students<C: ConnectionTrait>(
    db: &C,
    course_id: i32,
) -> Result<Vec<EnrolledStudent>, AppError> {
    find_course(db, course_id).await?;
    let enrollments = course_enrollment::Entity::find()
        .filter(course_enrollment::Column::CourseId.eq(course_id))
        .order_by_asc(course_enrollment::Column::EnrolledAt)
        .all(db)
        .await?;

    let user_ids: Vec<i32> = enrollments.iter().map(|e| e.user_id).collect();
    let users: HashMap<i32, user::Model> = user::Entity::find()
        .filter(user::Column::Id.is_in(user_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    Ok(enrollments
        .into_iter()
        .filter_map(|e| {
            users.get(&e.user_id).map(|u| EnrolledStudent {
                user_id: u.id,
                name: u.name.clone(),
                email: u.email.clone(),
                enrolled_at: e.enrolled_at,
            })
        })
        .collect())
}

async fn insert_material<C: ConnectionTrait>(
    db: &C,
    course_id: i32,
    m: MaterialRequest,
) -> Result<institution_material::Model, AppError> {
    let now = Utc::now();
    let model = institution_material::ActiveModel {
        course_id: Set(course_id),
        title: Set(m.title.trim().to_string()),
        description: Set(trim_opt(m.description)),
        filename: Set(m.filename.trim().to_string()),
        material_type: Set(m.material_type.trim().to_string()),
        size: Set(m.size),
        uploaded_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(model)
}

async fn insert_video<C: ConnectionTrait>(
    db: &C,
    course_id: i32,
    v: VideoRequest,
) -> Result<institution_video::Model, AppError> {
    let now = Utc::now();
    let model = institution_video::ActiveModel {
        course_id: Set(course_id),
        title: Set(v.title.trim().to_string()),
        description: Set(trim_opt(v.description)),
        filename: Set(v.filename.trim().to_string()),
        duration: Set(v.duration),
        thumbnail: Set(trim_opt(v.thumbnail)),
        url: Set(trim_opt(v.url)),
        uploaded_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(model)
}

async fn insert_question<C: ConnectionTrait>(
    db: &C,
    course_id: i32,
    q: QuestionRequest,
) -> Result<institution_question::Model, AppError> {
    let now = Utc::now();
    let model = institution_question::ActiveModel {
        course_id: Set(course_id),
        question: Set(q.question.trim().to_string()),
        alternatives: Set(encode_alternatives(&q.alternatives)?),
        correct_answer: Set(q.correct_answer),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(model)
}

pub async fn add_material<C: ConnectionTrait>(
    db: &C,
    course_id: i32,
    m: MaterialRequest,
) -> Result<CourseAggregate, AppError> {
    find_course(db, course_id).await?;
    insert_material(db, course_id, m).await?;
    load_course(db, course_id).await
}

pub async fn add_video<C: ConnectionTrait>(
    db: &C,
    course_id: i32,
    v: VideoRequest,
) -> Result<CourseAggregate, AppError> {
    find_course(db, course_id).await?;
    insert_video(db, course_id, v).await?;
    load_course(db, course_id).await
}

pub async fn add_question<C: ConnectionTrait>(
    db: &C,
    course_id: i32,
    q: QuestionRequest,
) -> Result<CourseAggregate, AppError> {
    find_course(db, course_id).await?;
    insert_question(db, course_id, q).await?;
    load_course(db, course_id).await
}

pub async fn update_material<C: ConnectionTrait>(
    db: &C,
    course_id: i32,
    material_id: i32,
    m: MaterialRequest,
) -> Result<CourseAggregate, AppError> {
    find_course(db, course_id).await?;
    let existing = institution_material::Entity::find_by_id(material_id)
        .filter(institution_material::Column::CourseId.eq(course_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Material not found with id: {material_id}")))?;

    let mut active: institution_material::ActiveModel = existing.into();
    active.title = Set(m.title.trim().to_string());
    active.description = Set(trim_opt(m.description));
    active.filename = Set(m.filename.trim().to_string());
    active.material_type = Set(m.material_type.trim().to_string());
    active.size = Set(m.size);
    active.updated_at = Set(Utc::now());
    active.update(db).await?;

    load_course(db, course_id).await
}

pub async fn update_video<C: ConnectionTrait>(
    db: &C,
    course_id: i32,
    video_id: i32,
    v: VideoRequest,
) -> Result<CourseAggregate, AppError> {
    find_course(db, course_id).await?;
    let existing = institution_video::Entity::find_by_id(video_id)
        .filter(institution_video::Column::CourseId.eq(course_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video not found with id: {video_id}")))?;

    let mut active: institution_video::ActiveModel = existing.into();
    active.title = Set(v.title.trim().to_string());
    active.description = Set(trim_opt(v.description));
    active.filename = Set(v.filename.trim().to_string());
    active.duration = Set(v.duration);
    active.thumbnail = Set(trim_opt(v.thumbnail));
    active.url = Set(trim_opt(v.url));
    active.updated_at = Set(Utc::now());
    active.update(db).await?;

    load_course(db, course_id).await
}

pub async fn update_question<C: ConnectionTrait>(
    db: &C,
    course_id: i32,
    question_id: i32,
    q: QuestionRequest,
) -> Result<CourseAggregate, AppError> {
    find_course(db, course_id).await?;
    let existing = institution_question::Entity::find_by_id(question_id)
        .filter(institution_question::Column::CourseId.eq(course_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Question not found with id: {question_id}")))?;

    let mut active: institution_question::ActiveModel = existing.into();
    active.question = Set(q.question.trim().to_string());
    active.alternatives = Set(encode_alternatives(&q.alternatives)?);
    active.correct_answer = Set(q.correct_answer);
    active.updated_at = Set(Utc::now());
    active.update(db).await?;

    load_course(db, course_id).await
}

pub async fn remove_material<C: ConnectionTrait>(
    db: &C,
    course_id: i32,
    material_id: i32,
) -> Result<CourseAggregate, AppError> {
    find_course(db, course_id).await?;
    let res = institution_material::Entity::delete_many()
        .filter(institution_material::Column::Id.eq(material_id))
        .filter(institution_material::Column::CourseId.eq(course_id))
        .exec(db)
        .await?;
    if res.rows_affected == 0 {
        return Err(AppError::NotFound(format!(
            "Material not found with id: {material_id}"
        )));
    }
    load_course(db, course_id).await
}

pub async fn remove_video<C: ConnectionTrait>(
    db: &C,
    course_id: i32,
    video_id: i32,
) -> Result<CourseAggregate, AppError> {
    find_course(db, course_id).await?;
    let res = institution_video::Entity::delete_many()
        .filter(institution_video::Column::Id.eq(video_id))
        .filter(institution_video::Column::CourseId.eq(course_id))
        .exec(db)
        .await?;
    if res.rows_affected == 0 {
        return Err(AppError::NotFound(format!(
            "Video not found with id: {video_id}"
        )));
    }
    load_course(db, course_id).await
}

pub async fn remove_question<C: ConnectionTrait>(
    db: &C,
    course_id: i32,
    question_id: i32,
) -> Result<CourseAggregate, AppError> {
    find_course(db, course_id).await?;
    let res = institution_question::Entity::delete_many()
        .filter(institution_question::Column::Id.eq(question_id))
        .filter(institution_question::Column::CourseId.eq(course_id))
        .exec(db)
        .await?;
    if res.rows_affected == 0 {
        return Err(AppError::NotFound(format!(
            "Question not found with id: {question_id}"
        )));
    }
    load_course(db, course_id).await
}

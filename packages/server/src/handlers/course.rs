use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::CourseStatus;
use sea_orm::TransactionTrait;
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppPath};
use crate::handlers::upload::{discard_image, store_image_field};
use crate::models::course::{
    CourseAggregate, CourseResponse, CreateCourseRequest, EnrolledStudent, UpdateCourseRequest,
    validate_create_course, validate_update_course,
};
use crate::models::shared::{ApiResponse, MessageResponse, SearchQuery};
use crate::policy::Action;
use crate::services;
use crate::state::AppState;

fn to_responses(courses: Vec<CourseAggregate>) -> Vec<CourseResponse> {
    courses.into_iter().map(CourseResponse::from).collect()
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Institution Courses",
    operation_id = "listCourses",
    summary = "List all courses",
    responses(
        (status = 200, description = "Courses", body = ApiResponse<Vec<CourseResponse>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_courses(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let courses = services::course::list_courses(&state.db).await?;
    Ok(ApiResponse::ok(to_responses(courses)))
}

#[utoipa::path(
    get,
    path = "/search",
    tag = "Institution Courses",
    operation_id = "searchCourses",
    summary = "Search courses by name",
    description = "Case-insensitive substring match on the course name.",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching courses", body = ApiResponse<Vec<CourseResponse>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, query), fields(query = %query.query))]
pub async fn search_courses(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let courses = services::course::search_courses(&state.db, &query.query).await?;
    Ok(ApiResponse::ok(to_responses(courses)))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Institution Courses",
    operation_id = "getCourse",
    summary = "Get a course with its content",
    params(("id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course", body = ApiResponse<CourseResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_course(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    let course = services::course::load_course(&state.db, id).await?;
    Ok(ApiResponse::ok(CourseResponse::from(course)))
}

#[utoipa::path(
    get,
    path = "/institution/{institution_id}",
    tag = "Institution Courses",
    operation_id = "listInstitutionCourses",
    summary = "List the courses of an institution",
    params(("institution_id" = i32, Path, description = "Institution ID")),
    responses(
        (status = 200, description = "Courses", body = ApiResponse<Vec<CourseResponse>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_institution_courses(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(institution_id): AppPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    let courses = services::course::list_by_institution(&state.db, institution_id, None).await?;
    Ok(ApiResponse::ok(to_responses(courses)))
}

#[utoipa::path(
    get,
    path = "/institution/{institution_id}/status/{status}",
    tag = "Institution Courses",
    operation_id = "listInstitutionCoursesByStatus",
    summary = "List the courses of an institution in a given status",
    params(
        ("institution_id" = i32, Path, description = "Institution ID"),
        ("status" = CourseStatus, Path, description = "`DRAFT`, `ACTIVE` or `ARCHIVED` (case-insensitive)"),
    ),
    responses(
        (status = 200, description = "Courses", body = ApiResponse<Vec<CourseResponse>>),
        (status = 400, description = "Unknown status (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_institution_courses_by_status(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath((institution_id, status)): AppPath<(i32, String)>,
) -> Result<impl IntoResponse, AppError> {
    let status: CourseStatus = status.parse()?;
    let courses =
        services::course::list_by_institution(&state.db, institution_id, Some(status)).await?;
    Ok(ApiResponse::ok(to_responses(courses)))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Institution Courses",
    operation_id = "createCourse",
    summary = "Create a course",
    description = "Creates a course with optional initial materials, videos and questions. \
        Requires `ADMIN`, or `INSTITUTION_ADMIN`/`INSTITUTION_STAFF` of the target institution. \
        Settings default to open enrollment, no approval, 100 students.",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = ApiResponse<CourseResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Institution not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(institution_id = payload.institution_id))]
pub async fn create_course(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.authorize(Some(payload.institution_id), Action::CreateCourse)?;
    validate_create_course(&payload)?;

    let txn = state.db.begin().await?;
    let course = services::course::create_course(&txn, payload).await?;
    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(
            CourseResponse::from(course),
            "Institution course created successfully",
        ),
    ))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Institution Courses",
    operation_id = "updateCourse",
    summary = "Update a course",
    description = "Replaces name, description and image. `status` and `settings` are kept when \
        omitted. Each of `materials`, `videos` and `questions` replaces the whole collection when \
        present (an empty list clears it) and leaves it untouched when omitted.",
    params(("id" = i32, Path, description = "Course ID")),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Course updated", body = ApiResponse<CourseResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_course(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateCourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_update_course(&payload)?;

    let txn = state.db.begin().await?;
    let existing = services::course::find_course(&txn, id).await?;
    auth_user.authorize(Some(existing.institution_id), Action::ManageCourse)?;
    let course = services::course::update_course(&txn, id, payload).await?;
    txn.commit().await?;

    Ok(ApiResponse::with_message(
        CourseResponse::from(course),
        "Institution course updated successfully",
    ))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Institution Courses",
    operation_id = "deleteCourse",
    summary = "Delete a course",
    description = "Deletes the course with its content and enrollments. Requires `ADMIN`, or \
        `INSTITUTION_ADMIN` of the owning institution.",
    params(("id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_course(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    let existing = services::course::find_course(&txn, id).await?;
    auth_user.authorize(Some(existing.institution_id), Action::DeleteCourse)?;
    services::course::delete_course(&txn, id).await?;
    txn.commit().await?;

    Ok(MessageResponse::new("Institution course deleted successfully"))
}

#[utoipa::path(
    post,
    path = "/{id}/image",
    tag = "Institution Courses",
    operation_id = "uploadCourseImage",
    summary = "Upload a course cover image",
    description = "Stores the `image` multipart field and sets it as the course image. \
        Returns the stored relative path.",
    params(("id" = i32, Path, description = "Course ID")),
    request_body(content_type = "multipart/form-data", description = "Image file in the `image` field"),
    responses(
        (status = 200, description = "Image stored; data is its relative path", body = ApiResponse<String>),
        (status = 400, description = "Missing field, non-image or oversize file (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart))]
pub async fn upload_course_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let existing = services::course::find_course(&state.db, id).await?;
    auth_user.authorize(Some(existing.institution_id), Action::ManageCourse)?;

    let image = store_image_field(&state, &mut multipart).await?;

    let saved = async {
        let txn = state.db.begin().await?;
        services::course::set_course_image(&txn, id, image.path.clone()).await?;
        txn.commit().await?;
        Ok::<_, AppError>(())
    }
    .await;
    if let Err(e) = saved {
        discard_image(&state, &image).await;
        return Err(e);
    }

    info!(course_id = id, path = %image.path, "Course image uploaded");
    Ok(ApiResponse::with_message(image.path, "Image uploaded successfully"))
}

#[utoipa::path(
    post,
    path = "/{id}/enroll/{user_id}",
    tag = "Enrollment",
    operation_id = "enrollStudent",
    summary = "Enroll a student in a course",
    description = "Students may enroll themselves; admins may enroll anyone. Fails with \
        `REJECTED` when enrollment is disabled, the course is full or the student is already \
        enrolled.",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("user_id" = i32, Path, description = "Student user ID"),
    ),
    responses(
        (status = 200, description = "Student enrolled", body = ApiResponse<bool>),
        (status = 400, description = "Enrollment rejected (REJECTED)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course or user not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn enroll_student(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath((course_id, user_id)): AppPath<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_self_or_admin(user_id)?;

    let txn = state.db.begin().await?;
    let enrolled = services::course::enroll_student(&txn, course_id, user_id).await?;
    txn.commit().await?;

    if !enrolled {
        return Err(AppError::rejected(
            "Failed to enroll student",
            "Student may already be enrolled or course settings don't allow enrollment",
        ));
    }
    Ok(ApiResponse::with_message(
        true,
        "Student enrolled in course successfully",
    ))
}

#[utoipa::path(
    delete,
    path = "/{id}/enroll/{user_id}",
    tag = "Enrollment",
    operation_id = "unenrollStudent",
    summary = "Remove a student from a course",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("user_id" = i32, Path, description = "Student user ID"),
    ),
    responses(
        (status = 200, description = "Student removed", body = ApiResponse<bool>),
        (status = 400, description = "Student was not enrolled (REJECTED)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn unenroll_student(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath((course_id, user_id)): AppPath<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_self_or_admin(user_id)?;

    let txn = state.db.begin().await?;
    let removed = services::course::unenroll_student(&txn, course_id, user_id).await?;
    txn.commit().await?;

    if !removed {
        return Err(AppError::rejected(
            "Failed to unenroll student",
            "Student is not enrolled in this course",
        ));
    }
    Ok(ApiResponse::with_message(
        true,
        "Student unenrolled from course successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/{id}/students",
    tag = "Enrollment",
    operation_id = "listEnrolledStudents",
    summary = "List the students enrolled in a course",
    params(("id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Enrolled students", body = ApiResponse<Vec<EnrolledStudent>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_enrolled_students(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(course_id): AppPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    let existing = services::course::find_course(&state.db, course_id).await?;
    auth_user.authorize(Some(existing.institution_id), Action::ManageCourse)?;
    let students = services::course::list_enrolled_students(&state.db, course_id).await?;
    Ok(ApiResponse::ok(students))
}

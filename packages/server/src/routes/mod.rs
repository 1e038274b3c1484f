use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers::{auth, challenge, content, course, health, institution, upload, user};
use crate::state::AppState;

pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/institutions", institution_routes())
        .nest("/institution-courses", course_routes(config))
        .nest("/challenges", challenge_routes())
        .nest("/uploads", upload_routes(config))
        .nest("/health", OpenApiRouter::new().routes(routes!(health::health)))
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(auth::register))
        .routes(routes!(auth::login))
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(user::list_users, user::create_user))
        .routes(routes!(user::me))
        .routes(routes!(user::get_user, user::update_user, user::delete_user))
        .routes(routes!(user::list_institution_users))
}

fn institution_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            institution::list_institutions,
            institution::create_institution
        ))
        .routes(routes!(institution::search_institutions))
        .routes(routes!(
            institution::get_institution,
            institution::update_institution,
            institution::delete_institution
        ))
        .routes(routes!(institution::list_institutions_by_status))
}

fn course_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let crud = OpenApiRouter::new()
        .routes(routes!(course::list_courses, course::create_course))
        .routes(routes!(course::search_courses))
        .routes(routes!(
            course::get_course,
            course::update_course,
            course::delete_course
        ))
        .routes(routes!(course::list_institution_courses))
        .routes(routes!(course::list_institution_courses_by_status));

    let enrollment = OpenApiRouter::new()
        .routes(routes!(course::enroll_student, course::unenroll_student))
        .routes(routes!(course::list_enrolled_students));

    let content = OpenApiRouter::new()
        .routes(routes!(content::add_material))
        .routes(routes!(content::update_material, content::remove_material))
        .routes(routes!(content::add_video))
        .routes(routes!(content::update_video, content::remove_video))
        .routes(routes!(content::add_question))
        .routes(routes!(content::update_question, content::remove_question));

    let image = OpenApiRouter::new()
        .routes(routes!(course::upload_course_image))
        .layer(upload::image_upload_body_limit(config.upload.max_size));

    crud.merge(enrollment).merge(content).merge(image)
}

fn challenge_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            challenge::list_challenges,
            challenge::create_challenge
        ))
        .routes(routes!(
            challenge::get_challenge,
            challenge::update_challenge,
            challenge::delete_challenge
        ))
        .routes(routes!(challenge::list_challenges_by_family))
        .routes(routes!(challenge::list_challenges_by_status))
        .routes(routes!(challenge::list_challenges_by_type))
        .routes(routes!(challenge::list_participants))
        .routes(routes!(challenge::participate))
        .routes(routes!(challenge::complete))
}

fn upload_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(upload::upload_image))
        .layer(upload::image_upload_body_limit(config.upload.max_size))
}

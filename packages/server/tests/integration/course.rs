use common::Role;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::{Value, json};

use server::entity::{
    course_enrollment, institution_material, institution_question, institution_video,
};

use crate::common::{SEEDED_INSTITUTION, TestApp, TestUser, routes};

fn material(title: &str) -> Value {
    json!({"title": title, "filename": "apostila.pdf", "type": "PDF", "size": 2048})
}

fn video(title: &str) -> Value {
    json!({"title": title, "filename": "aula.mp4", "duration": 600})
}

fn question(text: &str) -> Value {
    json!({"question": text, "alternatives": ["3/4", "2/6", "1/8"], "correctAnswer": 0})
}

fn full_course() -> Value {
    json!({
        "description": "Frações e decimais",
        "materials": [material("Apostila")],
        "videos": [video("Aula 1")],
        "questions": [question("Quanto é 1/2 + 1/4?")],
    })
}

async fn staff(app: &TestApp) -> TestUser {
    app.create_user_with_role("Prof", Role::InstitutionStaff, Some(SEEDED_INSTITUTION))
        .await
}

async fn content_rows(app: &TestApp, course_id: i32) -> (u64, u64, u64) {
    let materials = institution_material::Entity::find()
        .filter(institution_material::Column::CourseId.eq(course_id))
        .count(&app.db)
        .await
        .unwrap();
    let videos = institution_video::Entity::find()
        .filter(institution_video::Column::CourseId.eq(course_id))
        .count(&app.db)
        .await
        .unwrap();
    let questions = institution_question::Entity::find()
        .filter(institution_question::Column::CourseId.eq(course_id))
        .count(&app.db)
        .await
        .unwrap();
    (materials, videos, questions)
}

mod crud {
    use super::*;

    #[tokio::test]
    async fn staff_creates_a_course_with_content() {
        let app = TestApp::spawn().await;
        let staff = staff(&app).await;

        let mut body = full_course();
        body["institutionId"] = json!(SEEDED_INSTITUTION);
        body["name"] = json!("Matemática Básica");
        let res = app.post_with_token(routes::COURSES, &body, &staff.token).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["message"], "Institution course created successfully");
        let data = res.data();
        assert_eq!(data["status"], "DRAFT");
        assert_eq!(data["settings"]["allowEnrollment"], true);
        assert_eq!(data["materials"][0]["type"], "PDF");
        assert_eq!(data["videos"][0]["duration"], 600);
        assert_eq!(data["questions"][0]["alternatives"].as_array().unwrap().len(), 3);
        assert_eq!(data["studentsEnrolled"], json!([]));
    }

    #[tokio::test]
    async fn staff_of_another_institution_cannot_create_courses_here() {
        let app = TestApp::spawn().await;
        let other = app.create_institution("Outra Escola").await;
        let outsider = app
            .create_user_with_role("Prof", Role::InstitutionStaff, Some(other))
            .await;

        let res = app
            .post_with_token(
                routes::COURSES,
                &json!({"institutionId": SEEDED_INSTITUTION, "name": "Intrusão"}),
                &outsider.token,
            )
            .await;

        res.assert_error(403, "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn plain_user_cannot_create_courses() {
        let app = TestApp::spawn().await;
        let user = app.create_user("Ana").await;

        let res = app
            .post_with_token(
                routes::COURSES,
                &json!({"institutionId": SEEDED_INSTITUTION, "name": "Curso"}),
                &user.token,
            )
            .await;

        res.assert_error(403, "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn course_for_a_missing_institution_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;

        let res = app
            .post_with_token(
                routes::COURSES,
                &json!({"institutionId": 9999, "name": "Curso"}),
                &admin.token,
            )
            .await;

        res.assert_error(404, "NOT_FOUND");
    }

    #[tokio::test]
    async fn question_with_out_of_range_answer_is_invalid() {
        let app = TestApp::spawn().await;
        let staff = staff(&app).await;

        let res = app
            .post_with_token(
                routes::COURSES,
                &json!({
                    "institutionId": SEEDED_INSTITUTION,
                    "name": "Curso",
                    "questions": [{"question": "?", "alternatives": ["a", "b"], "correctAnswer": 2}],
                }),
                &staff.token,
            )
            .await;

        res.assert_error(400, "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn reading_courses_requires_a_token() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::COURSES).await;

        res.assert_error(401, "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn missing_course_is_not_found() {
        let app = TestApp::spawn().await;
        let user = app.create_user("Ana").await;

        let res = app.get_with_token(&routes::course(4242), &user.token).await;

        res.assert_error(404, "NOT_FOUND");
        assert_eq!(res.body["message"], "Institution course not found with id: 4242");
    }

    #[tokio::test]
    async fn omitted_content_lists_are_kept_and_empty_lists_clear() {
        let app = TestApp::spawn().await;
        let staff = staff(&app).await;
        let id = app
            .create_course(&staff.token, SEEDED_INSTITUTION, full_course())
            .await;

        let res = app
            .put_with_token(
                &routes::course(id),
                &json!({"name": "Matemática II", "status": "ACTIVE"}),
                &staff.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["name"], "Matemática II");
        assert_eq!(res.data()["status"], "ACTIVE");
        assert_eq!(res.data()["materials"].as_array().unwrap().len(), 1);
        assert_eq!(res.data()["videos"].as_array().unwrap().len(), 1);

        let res = app
            .put_with_token(
                &routes::course(id),
                &json!({"name": "Matemática II", "materials": [], "videos": [video("Nova aula"), video("Outra")]}),
                &staff.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.data()["materials"].as_array().unwrap().is_empty());
        assert_eq!(res.data()["videos"].as_array().unwrap().len(), 2);
        assert_eq!(res.data()["questions"].as_array().unwrap().len(), 1);
        assert_eq!(res.data()["status"], "ACTIVE");

        assert_eq!(content_rows(&app, id).await, (0, 2, 1));
    }

    #[tokio::test]
    async fn staff_cannot_delete_but_institution_admin_can() {
        let app = TestApp::spawn().await;
        let staff = staff(&app).await;
        let inst_admin = app
            .create_user_with_role("Gestor", Role::InstitutionAdmin, Some(SEEDED_INSTITUTION))
            .await;
        let student = app.create_user("Ana").await;
        let id = app
            .create_course(&staff.token, SEEDED_INSTITUTION, full_course())
            .await;
        let enrolled = app.post_empty(&routes::enroll(id, student.id), &student.token).await;
        assert_eq!(enrolled.status, 200, "{}", enrolled.text);

        let denied = app.delete_with_token(&routes::course(id), &staff.token).await;
        denied.assert_error(403, "PERMISSION_DENIED");

        let res = app
            .delete_with_token(&routes::course(id), &inst_admin.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "Institution course deleted successfully");

        assert_eq!(content_rows(&app, id).await, (0, 0, 0));
        let enrollments = course_enrollment::Entity::find()
            .filter(course_enrollment::Column::CourseId.eq(id))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!(enrollments, 0);
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn courses_filter_by_institution_and_status() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let other = app.create_institution("Outra Escola").await;
        app.create_course(&admin.token, SEEDED_INSTITUTION, json!({"status": "ACTIVE"}))
            .await;
        app.create_course(&admin.token, SEEDED_INSTITUTION, json!({})).await;
        app.create_course(&admin.token, other, json!({})).await;

        let all = app.get_with_token(routes::COURSES, &admin.token).await;
        assert_eq!(all.data().as_array().unwrap().len(), 3);

        let mine = app
            .get_with_token(&routes::institution_courses(SEEDED_INSTITUTION), &admin.token)
            .await;
        assert_eq!(mine.data().as_array().unwrap().len(), 2);

        let active = app
            .get_with_token(
                &routes::institution_courses_by_status(SEEDED_INSTITUTION, "active"),
                &admin.token,
            )
            .await;
        assert_eq!(active.status, 200, "{}", active.text);
        let active = active.data().as_array().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0]["status"], "ACTIVE");
    }

    #[tokio::test]
    async fn search_matches_name_ignoring_case() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        app.create_course(&admin.token, SEEDED_INSTITUTION, json!({"name": "História do Brasil"}))
            .await;
        app.create_course(&admin.token, SEEDED_INSTITUTION, json!({"name": "Geografia"}))
            .await;

        let res = app
            .get_with_token(&routes::course_search("BRASIL"), &admin.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let found = res.data().as_array().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["name"], "História do Brasil");
    }
}

mod enrollment {
    use super::*;

    #[tokio::test]
    async fn student_enrolls_and_appears_in_the_course() {
        let app = TestApp::spawn().await;
        let staff = staff(&app).await;
        let student = app.create_user("Ana").await;
        let id = app.create_course(&staff.token, SEEDED_INSTITUTION, json!({})).await;

        let res = app.post_empty(&routes::enroll(id, student.id), &student.token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data(), &json!(true));
        assert_eq!(res.body["message"], "Student enrolled in course successfully");

        let course = app.get_with_token(&routes::course(id), &student.token).await;
        assert_eq!(course.data()["studentsEnrolled"], json!([student.id]));

        let students = app
            .get_with_token(&routes::course_students(id), &staff.token)
            .await;
        assert_eq!(students.status, 200, "{}", students.text);
        assert_eq!(students.data()[0]["userId"], student.id);
        assert_eq!(students.data()[0]["email"], "ana@example.com");

        let me = app.get_with_token(routes::ME, &student.token).await;
        assert_eq!(me.data()["enrolledCourseIds"], json!([id]));
    }

    #[tokio::test]
    async fn enrolling_twice_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let student = app.create_user("Ana").await;
        let id = app.create_course(&admin.token, SEEDED_INSTITUTION, json!({})).await;

        let first = app.post_empty(&routes::enroll(id, student.id), &student.token).await;
        assert_eq!(first.status, 200, "{}", first.text);

        let res = app.post_empty(&routes::enroll(id, student.id), &student.token).await;

        res.assert_error(400, "REJECTED");
        assert_eq!(res.body["message"], "Failed to enroll student");
        assert_eq!(
            res.body["errors"],
            "Student may already be enrolled or course settings don't allow enrollment"
        );
    }

    #[tokio::test]
    async fn closed_course_rejects_enrollment() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let student = app.create_user("Ana").await;
        let id = app
            .create_course(
                &admin.token,
                SEEDED_INSTITUTION,
                json!({"settings": {"allowEnrollment": false, "requireApproval": false}}),
            )
            .await;

        let res = app.post_empty(&routes::enroll(id, student.id), &student.token).await;

        res.assert_error(400, "REJECTED");
    }

    #[tokio::test]
    async fn full_course_rejects_enrollment() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let first = app.create_user("Ana").await;
        let second = app.create_user("Bruno").await;
        let id = app
            .create_course(
                &admin.token,
                SEEDED_INSTITUTION,
                json!({"settings": {"allowEnrollment": true, "requireApproval": false, "maxStudents": 1}}),
            )
            .await;

        let ok = app.post_empty(&routes::enroll(id, first.id), &first.token).await;
        assert_eq!(ok.status, 200, "{}", ok.text);

        let res = app.post_empty(&routes::enroll(id, second.id), &second.token).await;

        res.assert_error(400, "REJECTED");
    }

    #[tokio::test]
    async fn user_cannot_enroll_someone_else() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let ana = app.create_user("Ana").await;
        let bruno = app.create_user("Bruno").await;
        let id = app.create_course(&admin.token, SEEDED_INSTITUTION, json!({})).await;

        let res = app.post_empty(&routes::enroll(id, bruno.id), &ana.token).await;
        res.assert_error(403, "PERMISSION_DENIED");

        let by_admin = app.post_empty(&routes::enroll(id, bruno.id), &admin.token).await;
        assert_eq!(by_admin.status, 200, "{}", by_admin.text);
    }

    #[tokio::test]
    async fn enrolling_a_missing_user_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let id = app.create_course(&admin.token, SEEDED_INSTITUTION, json!({})).await;

        let res = app.post_empty(&routes::enroll(id, 9999), &admin.token).await;

        res.assert_error(404, "NOT_FOUND");
    }

    #[tokio::test]
    async fn unenroll_removes_the_student_once() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let student = app.create_user("Ana").await;
        let id = app.create_course(&admin.token, SEEDED_INSTITUTION, json!({})).await;
        app.post_empty(&routes::enroll(id, student.id), &student.token).await;

        let res = app
            .delete_with_token(&routes::enroll(id, student.id), &student.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "Student unenrolled from course successfully");

        let again = app
            .delete_with_token(&routes::enroll(id, student.id), &student.token)
            .await;
        again.assert_error(400, "REJECTED");
        assert_eq!(again.body["errors"], "Student is not enrolled in this course");
    }

    #[tokio::test]
    async fn plain_user_cannot_list_enrolled_students() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let student = app.create_user("Ana").await;
        let id = app.create_course(&admin.token, SEEDED_INSTITUTION, json!({})).await;

        let res = app
            .get_with_token(&routes::course_students(id), &student.token)
            .await;

        res.assert_error(403, "PERMISSION_DENIED");
    }
}

mod content {
    use super::*;

    #[tokio::test]
    async fn material_lifecycle() {
        let app = TestApp::spawn().await;
        let staff = staff(&app).await;
        let id = app.create_course(&staff.token, SEEDED_INSTITUTION, json!({})).await;

        let added = app
            .post_with_token(&routes::course_materials(id), &material("Apostila"), &staff.token)
            .await;
        assert_eq!(added.status, 200, "{}", added.text);
        assert_eq!(added.body["message"], "Material added to course successfully");
        let material_id = added.data()["materials"][0]["id"].as_i64().unwrap() as i32;

        let updated = app
            .put_with_token(
                &routes::course_material(id, material_id),
                &material("Apostila revisada"),
                &staff.token,
            )
            .await;
        assert_eq!(updated.status, 200, "{}", updated.text);
        assert_eq!(updated.data()["materials"][0]["title"], "Apostila revisada");
        assert_eq!(updated.data()["materials"][0]["id"], material_id);

        let removed = app
            .delete_with_token(&routes::course_material(id, material_id), &staff.token)
            .await;
        assert_eq!(removed.status, 200, "{}", removed.text);
        assert!(removed.data()["materials"].as_array().unwrap().is_empty());

        let again = app
            .delete_with_token(&routes::course_material(id, material_id), &staff.token)
            .await;
        again.assert_error(404, "NOT_FOUND");
    }

    #[tokio::test]
    async fn video_and_question_can_be_added_and_updated() {
        let app = TestApp::spawn().await;
        let staff = staff(&app).await;
        let id = app.create_course(&staff.token, SEEDED_INSTITUTION, json!({})).await;

        let with_video = app
            .post_with_token(&routes::course_videos(id), &video("Aula 1"), &staff.token)
            .await;
        assert_eq!(with_video.status, 200, "{}", with_video.text);
        let video_id = with_video.data()["videos"][0]["id"].as_i64().unwrap() as i32;

        let with_question = app
            .post_with_token(&routes::course_questions(id), &question("2 + 2?"), &staff.token)
            .await;
        assert_eq!(with_question.status, 200, "{}", with_question.text);
        assert_eq!(with_question.data()["videos"].as_array().unwrap().len(), 1);
        let question_id = with_question.data()["questions"][0]["id"].as_i64().unwrap() as i32;

        let res = app
            .put_with_token(
                &routes::course_video(id, video_id),
                &json!({"title": "Aula 1 (HD)", "filename": "aula-hd.mp4"}),
                &staff.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["videos"][0]["filename"], "aula-hd.mp4");

        let res = app
            .put_with_token(
                &routes::course_question(id, question_id),
                &json!({"question": "2 + 3?", "alternatives": ["4", "5"], "correctAnswer": 1}),
                &staff.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["questions"][0]["correctAnswer"], 1);

        let res = app
            .delete_with_token(&routes::course_question(id, question_id), &staff.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "Question removed from course successfully");
    }

    #[tokio::test]
    async fn item_from_another_course_is_not_found() {
        let app = TestApp::spawn().await;
        let staff = staff(&app).await;
        let first = app
            .create_course(&staff.token, SEEDED_INSTITUTION, full_course())
            .await;
        let second = app.create_course(&staff.token, SEEDED_INSTITUTION, json!({})).await;

        let course = app.get_with_token(&routes::course(first), &staff.token).await;
        let material_id = course.data()["materials"][0]["id"].as_i64().unwrap() as i32;

        let res = app
            .put_with_token(
                &routes::course_material(second, material_id),
                &material("Sequestrada"),
                &staff.token,
            )
            .await;
        res.assert_error(404, "NOT_FOUND");
        assert_eq!(
            res.body["message"],
            format!("Material not found with id: {material_id}")
        );

        let res = app
            .delete_with_token(&routes::course_material(second, material_id), &staff.token)
            .await;
        res.assert_error(404, "NOT_FOUND");

        assert_eq!(content_rows(&app, first).await, (1, 1, 1));
    }

    #[tokio::test]
    async fn outsider_cannot_edit_content() {
        let app = TestApp::spawn().await;
        let staff = staff(&app).await;
        let student = app.create_user("Ana").await;
        let id = app.create_course(&staff.token, SEEDED_INSTITUTION, json!({})).await;

        let res = app
            .post_with_token(&routes::course_videos(id), &video("Aula"), &student.token)
            .await;

        res.assert_error(403, "PERMISSION_DENIED");
    }
}

use common::Role;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use server::entity::{challenge_completion, challenge_participant, course_enrollment};

use crate::common::{PASSWORD, SEEDED_INSTITUTION, TestApp, routes};

mod profile {
    use super::*;

    #[tokio::test]
    async fn me_returns_the_caller_without_password() {
        let app = TestApp::spawn().await;
        let user = app.create_user("Ana").await;

        let res = app.get_with_token(routes::ME, &user.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["id"], user.id);
        assert_eq!(res.data()["email"], "ana@example.com");
        assert_eq!(res.data()["score"], 0);
        assert!(res.data().get("password").is_none());
    }

    #[tokio::test]
    async fn user_reads_self_but_not_others() {
        let app = TestApp::spawn().await;
        let ana = app.create_user("Ana").await;
        let bruno = app.create_user("Bruno").await;

        let own = app.get_with_token(&routes::user(ana.id), &ana.token).await;
        assert_eq!(own.status, 200, "{}", own.text);

        let other = app.get_with_token(&routes::user(bruno.id), &ana.token).await;
        other.assert_error(403, "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn self_update_cannot_escalate_role() {
        let app = TestApp::spawn().await;
        let ana = app.create_user("Ana").await;

        let res = app
            .put_with_token(
                &routes::user(ana.id),
                &json!({
                    "name": "Ana Paula",
                    "email": "ana@example.com",
                    "role": "ADMIN",
                    "institutionId": SEEDED_INSTITUTION,
                }),
                &ana.token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "User updated successfully");
        assert_eq!(res.data()["name"], "Ana Paula");
        assert_eq!(res.data()["role"], "USER");
        assert!(res.data()["institutionId"].is_null());
    }

    #[tokio::test]
    async fn password_change_takes_effect_on_login() {
        let app = TestApp::spawn().await;
        let ana = app.create_user("Ana").await;

        let res = app
            .put_with_token(
                &routes::user(ana.id),
                &json!({"name": "Ana", "email": "ana@example.com", "password": "novasenha"}),
                &ana.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let old = app.login("ana@example.com").await;
        old.assert_error(401, "INVALID_CREDENTIALS");

        let new = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "ana@example.com", "password": "novasenha"}),
            )
            .await;
        assert_eq!(new.status, 200, "{}", new.text);
    }

    #[tokio::test]
    async fn changing_email_to_a_taken_one_conflicts() {
        let app = TestApp::spawn().await;
        let ana = app.create_user("Ana").await;
        app.create_user("Bruno").await;

        let res = app
            .put_with_token(
                &routes::user(ana.id),
                &json!({"name": "Ana", "email": "bruno@example.com"}),
                &ana.token,
            )
            .await;

        res.assert_error(409, "EMAIL_TAKEN");
    }
}

mod administration {
    use super::*;

    #[tokio::test]
    async fn admin_creates_a_user_with_role_and_institution() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;

        let res = app
            .post_with_token(
                routes::USERS,
                &json!({
                    "name": "Gestora",
                    "email": "gestora@escola.br",
                    "password": PASSWORD,
                    "role": "INSTITUTION_ADMIN",
                    "institutionId": SEEDED_INSTITUTION,
                }),
                &admin.token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["message"], "User created successfully");
        assert_eq!(res.data()["role"], "INSTITUTION_ADMIN");
        assert_eq!(res.data()["institutionId"], SEEDED_INSTITUTION);
    }

    #[tokio::test]
    async fn admin_detaches_a_user_from_the_institution() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let member = app
            .create_user_with_role("Bruno", Role::User, Some(SEEDED_INSTITUTION))
            .await;

        let kept = app
            .put_with_token(
                &routes::user(member.id),
                &json!({"name": "Bruno", "email": "bruno@example.com"}),
                &admin.token,
            )
            .await;
        assert_eq!(kept.status, 200, "{}", kept.text);
        assert_eq!(kept.data()["institutionId"], SEEDED_INSTITUTION);

        let cleared = app
            .put_with_token(
                &routes::user(member.id),
                &json!({
                    "name": "Bruno",
                    "email": "bruno@example.com",
                    "institutionId": null,
                }),
                &admin.token,
            )
            .await;
        assert_eq!(cleared.status, 200, "{}", cleared.text);
        assert!(cleared.data()["institutionId"].is_null());
    }

    #[tokio::test]
    async fn non_admin_cannot_create_users() {
        let app = TestApp::spawn().await;
        let inst_admin = app
            .create_user_with_role("Gestor", Role::InstitutionAdmin, Some(SEEDED_INSTITUTION))
            .await;

        let res = app
            .post_with_token(
                routes::USERS,
                &json!({"name": "X", "email": "x@escola.br", "password": PASSWORD}),
                &inst_admin.token,
            )
            .await;

        res.assert_error(403, "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn listing_users_needs_an_administrator() {
        let app = TestApp::spawn().await;
        let user = app.create_user("Ana").await;
        let admin = app.create_admin().await;

        let denied = app.get_with_token(routes::USERS, &user.token).await;
        denied.assert_error(403, "PERMISSION_DENIED");

        let res = app.get_with_token(routes::USERS, &admin.token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data().as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn institution_admin_lists_only_own_members() {
        let app = TestApp::spawn().await;
        let other = app.create_institution("Outra Escola").await;
        let inst_admin = app
            .create_user_with_role("Gestor", Role::InstitutionAdmin, Some(SEEDED_INSTITUTION))
            .await;
        app.create_user_with_role("Prof", Role::InstitutionStaff, Some(SEEDED_INSTITUTION))
            .await;
        app.create_user_with_role("Outro", Role::InstitutionStaff, Some(other))
            .await;

        let res = app
            .get_with_token(&routes::institution_users(SEEDED_INSTITUTION), &inst_admin.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data().as_array().unwrap().len(), 2);

        let denied = app
            .get_with_token(&routes::institution_users(other), &inst_admin.token)
            .await;
        denied.assert_error(403, "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn deleting_a_user_removes_their_links() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let ana = app.create_user("Ana").await;
        let course = app.create_course(&admin.token, SEEDED_INSTITUTION, json!({})).await;
        let challenge = app.create_challenge(&admin.token, "Mutirão", 10).await;
        app.post_empty(&routes::enroll(course, ana.id), &ana.token).await;
        app.post_empty(&routes::participate(challenge, ana.id), &ana.token).await;
        app.post_empty(&routes::complete(challenge, ana.id), &ana.token).await;

        let denied = app.delete_with_token(&routes::user(ana.id), &ana.token).await;
        denied.assert_error(403, "PERMISSION_DENIED");

        let res = app.delete_with_token(&routes::user(ana.id), &admin.token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "User deleted successfully");

        let enrollments = course_enrollment::Entity::find()
            .filter(course_enrollment::Column::UserId.eq(ana.id))
            .count(&app.db)
            .await
            .unwrap();
        let participations = challenge_participant::Entity::find()
            .filter(challenge_participant::Column::UserId.eq(ana.id))
            .count(&app.db)
            .await
            .unwrap();
        let completions = challenge_completion::Entity::find()
            .filter(challenge_completion::Column::UserId.eq(ana.id))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!((enrollments, participations, completions), (0, 0, 0));

        let gone = app.get_with_token(&routes::user(ana.id), &admin.token).await;
        gone.assert_error(404, "NOT_FOUND");
    }
}

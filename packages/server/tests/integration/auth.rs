use common::Role;
use serde_json::json;

use crate::common::{PASSWORD, SEEDED_INSTITUTION, TestApp, routes};

mod registration {
    use super::*;

    #[tokio::test]
    async fn new_user_receives_a_token_on_registration() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"name": "Maria Silva", "email": "maria@escola.br", "password": PASSWORD}),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["success"], true);
        assert_eq!(res.body["message"], "User registered successfully");
        assert!(res.data()["token"].is_string());
        assert_eq!(res.data()["role"], "USER");
        assert_eq!(res.data()["name"], "Maria Silva");
        assert!(res.data()["userId"].is_number());
    }

    #[tokio::test]
    async fn cannot_register_with_an_already_taken_email() {
        let app = TestApp::spawn().await;
        let body = json!({"name": "Ana", "email": "ana@escola.br", "password": PASSWORD});

        let first = app.post_without_token(routes::REGISTER, &body).await;
        assert_eq!(first.status, 201, "First registration failed: {}", first.text);

        let res = app.post_without_token(routes::REGISTER, &body).await;

        res.assert_error(409, "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn email_uniqueness_ignores_case() {
        let app = TestApp::spawn().await;
        app.create_user("Ana").await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"name": "Ana", "email": "ANA@Example.com", "password": PASSWORD}),
            )
            .await;

        res.assert_error(409, "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn cannot_register_with_a_short_password() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"name": "Ana", "email": "ana@escola.br", "password": "123"}),
            )
            .await;

        res.assert_error(400, "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn cannot_register_with_a_malformed_email() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"name": "Ana", "email": "not-an-email", "password": PASSWORD}),
            )
            .await;

        res.assert_error(400, "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn anonymous_caller_cannot_pick_a_privileged_role() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({
                    "name": "Mallory",
                    "email": "mallory@example.com",
                    "password": PASSWORD,
                    "role": "ADMIN",
                }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.data()["role"], "USER");
    }

    #[tokio::test]
    async fn admin_can_register_institution_staff() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;

        let res = app
            .post_with_token(
                routes::REGISTER,
                &json!({
                    "name": "Carlos",
                    "email": "carlos@escola.br",
                    "password": PASSWORD,
                    "role": "INSTITUTION_STAFF",
                    "institutionId": SEEDED_INSTITUTION,
                }),
                &admin.token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.data()["role"], "INSTITUTION_STAFF");
        assert_eq!(res.data()["institutionId"], SEEDED_INSTITUTION);
    }

    #[tokio::test]
    async fn registering_into_a_missing_institution_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({
                    "name": "Ana",
                    "email": "ana@escola.br",
                    "password": PASSWORD,
                    "institutionId": 9999,
                }),
            )
            .await;

        res.assert_error(404, "NOT_FOUND");
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn registered_user_can_log_in() {
        let app = TestApp::spawn().await;
        let created = app.create_user("Bruno").await;

        let res = app.login("bruno@example.com").await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "Login successful");
        assert_eq!(res.data()["userId"], created.id);
        assert_eq!(res.data()["role"], "USER");
        assert!(res.data()["token"].is_string());
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;
        app.create_user("Bruno").await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "bruno@example.com", "password": "wrongpass"}),
            )
            .await;

        res.assert_error(401, "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn unknown_email_gets_the_same_error_as_a_wrong_password() {
        let app = TestApp::spawn().await;

        let res = app.login("nobody@example.com").await;

        res.assert_error(401, "INVALID_CREDENTIALS");
    }
}

mod tokens {
    use super::*;

    #[tokio::test]
    async fn protected_route_requires_a_token() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        res.assert_error(401, "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not-a-jwt").await;

        res.assert_error(401, "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn demoted_institution_admin_loses_access_with_an_old_token() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let inst_admin = app
            .create_user_with_role("Gestor", Role::InstitutionAdmin, Some(SEEDED_INSTITUTION))
            .await;
        let course = app
            .create_course(&admin.token, SEEDED_INSTITUTION, json!({}))
            .await;

        let demoted = app
            .put_with_token(
                &routes::user(inst_admin.id),
                &json!({
                    "name": "Gestor",
                    "email": "gestor@example.com",
                    "role": "USER",
                }),
                &admin.token,
            )
            .await;
        assert_eq!(demoted.status, 200, "{}", demoted.text);
        assert_eq!(demoted.data()["role"], "USER");

        let res = app
            .delete_with_token(&routes::course(course), &inst_admin.token)
            .await;

        res.assert_error(403, "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn token_of_a_deleted_user_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let other_admin = app.create_user_with_role("Root", Role::Admin, None).await;

        let deleted = app
            .delete_with_token(&routes::user(other_admin.id), &admin.token)
            .await;
        assert_eq!(deleted.status, 200, "{}", deleted.text);

        let res = app.get_with_token(routes::USERS, &other_admin.token).await;

        res.assert_error(401, "TOKEN_INVALID");
    }
}

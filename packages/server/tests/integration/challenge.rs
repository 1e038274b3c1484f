use common::Role;
use serde_json::json;

use crate::common::{SEEDED_INSTITUTION, TestApp, routes};

mod catalogue {
    use super::*;

    #[tokio::test]
    async fn default_challenges_are_seeded_once() {
        let app = TestApp::spawn().await;
        server::seed::run(&app.db).await.unwrap();

        let res = app.get_without_token(routes::CHALLENGES).await;

        assert_eq!(res.status, 200, "{}", res.text);
        let list = res.data().as_array().unwrap();
        assert_eq!(list.len(), 2);
        let walk = list.iter().find(|c| c["title"] == "Caminhada Diária").unwrap();
        assert_eq!(walk["type"], "PHYSICAL");
        assert_eq!(walk["score"], 150);
        assert_eq!(walk["status"], "ACTIVE");
        assert_eq!(walk["checks"], 0);
        let reading = list.iter().find(|c| c["title"] == "Leitura Semanal").unwrap();
        assert_eq!(reading["type"], "INTELLECTUAL");
        assert_eq!(reading["score"], 100);
    }

    #[tokio::test]
    async fn challenges_filter_by_type_and_status() {
        let app = TestApp::spawn().await;
        let user = app.create_user("Ana").await;
        app.create_challenge(&user.token, "Mutirão", 20).await;

        let social = app.get_without_token(&routes::challenges_by_type("social")).await;
        assert_eq!(social.status, 200, "{}", social.text);
        assert_eq!(social.data().as_array().unwrap().len(), 1);

        let physical = app.get_without_token(&routes::challenges_by_type("PHYSICAL")).await;
        assert_eq!(physical.data().as_array().unwrap().len(), 1);

        let active = app.get_without_token(&routes::challenges_by_status("ACTIVE")).await;
        assert_eq!(active.data().as_array().unwrap().len(), 3);

        let bogus = app.get_without_token(&routes::challenges_by_type("CULINARY")).await;
        bogus.assert_error(400, "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn challenges_filter_by_family() {
        let app = TestApp::spawn().await;
        let user = app.create_user("Ana").await;

        let res = app
            .post_with_token(
                routes::CHALLENGES,
                &json!({
                    "title": "Horta em família",
                    "description": "Plantem juntos",
                    "type": "ENVIRONMENTAL",
                    "score": 40,
                    "familyId": 7,
                }),
                &user.token,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);

        let family = app.get_without_token(&routes::challenges_by_family(7)).await;
        assert_eq!(family.data().as_array().unwrap().len(), 1);
        assert_eq!(family.data()[0]["familyId"], 7);

        let none = app.get_without_token(&routes::challenges_by_family(8)).await;
        assert!(none.data().as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_challenge_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::challenge(9999)).await;

        res.assert_error(404, "NOT_FOUND");
        assert_eq!(res.body["message"], "Challenge not found with id: 9999");
    }
}

mod management {
    use super::*;

    #[tokio::test]
    async fn scoped_challenge_requires_institution_membership() {
        let app = TestApp::spawn().await;
        let user = app.create_user("Ana").await;
        let staff = app
            .create_user_with_role("Prof", Role::InstitutionStaff, Some(SEEDED_INSTITUTION))
            .await;
        let body = json!({
            "title": "Gincana",
            "description": "Gincana da escola",
            "type": "SOCIAL",
            "score": 30,
            "institutionId": SEEDED_INSTITUTION,
        });

        let denied = app.post_with_token(routes::CHALLENGES, &body, &user.token).await;
        denied.assert_error(403, "PERMISSION_DENIED");

        let res = app.post_with_token(routes::CHALLENGES, &body, &staff.token).await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.data()["institutionId"], SEEDED_INSTITUTION);
    }

    #[tokio::test]
    async fn negative_score_is_invalid() {
        let app = TestApp::spawn().await;
        let user = app.create_user("Ana").await;

        let res = app
            .post_with_token(
                routes::CHALLENGES,
                &json!({"title": "X", "description": "Y", "type": "SOCIAL", "score": -5}),
                &user.token,
            )
            .await;

        res.assert_error(400, "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn update_keeps_status_when_omitted() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let id = app.create_challenge(&admin.token, "Mutirão", 20).await;

        let res = app
            .put_with_token(
                &routes::challenge(id),
                &json!({"title": "Mutirão de limpeza", "description": "Limpar a praça", "type": "ENVIRONMENTAL", "score": 25}),
                &admin.token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["title"], "Mutirão de limpeza");
        assert_eq!(res.data()["type"], "ENVIRONMENTAL");
        assert_eq!(res.data()["status"], "ACTIVE");
    }

    #[tokio::test]
    async fn unscoped_challenges_are_managed_by_admins_only() {
        let app = TestApp::spawn().await;
        let user = app.create_user("Ana").await;
        let admin = app.create_admin().await;
        let id = app.create_challenge(&user.token, "Mutirão", 20).await;

        let denied = app.delete_with_token(&routes::challenge(id), &user.token).await;
        denied.assert_error(403, "PERMISSION_DENIED");

        let res = app.delete_with_token(&routes::challenge(id), &admin.token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "Challenge deleted successfully");
    }
}

mod participation {
    use super::*;

    #[tokio::test]
    async fn completing_awards_score_and_counts_a_check() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let user = app.create_user("Ana").await;
        let id = app.create_challenge(&admin.token, "Mutirão", 40).await;

        let joined = app.post_empty(&routes::participate(id, user.id), &user.token).await;
        assert_eq!(joined.status, 200, "{}", joined.text);
        assert_eq!(joined.body["message"], "Successfully joined the challenge");

        let done = app.post_empty(&routes::complete(id, user.id), &user.token).await;
        assert_eq!(done.status, 200, "{}", done.text);
        assert_eq!(done.body["message"], "Challenge completed successfully");

        let challenge = app.get_without_token(&routes::challenge(id)).await;
        assert_eq!(challenge.data()["checks"], 1);
        assert_eq!(challenge.data()["participantIds"], json!([user.id]));
        assert_eq!(challenge.data()["completedByIds"], json!([user.id]));

        let me = app.get_with_token(routes::ME, &user.token).await;
        assert_eq!(me.data()["score"], 40);
        assert_eq!(me.data()["participatingChallengeIds"], json!([id]));
        assert_eq!(me.data()["completedChallengeIds"], json!([id]));

        let participants = app
            .get_with_token(&routes::challenge_participants(id), &user.token)
            .await;
        assert_eq!(participants.status, 200, "{}", participants.text);
        assert_eq!(participants.data()[0]["userId"], user.id);
        assert!(participants.data()[0]["completedAt"].is_string());
    }

    #[tokio::test]
    async fn completing_without_participating_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let user = app.create_user("Ana").await;
        let id = app.create_challenge(&admin.token, "Mutirão", 40).await;

        let res = app.post_empty(&routes::complete(id, user.id), &user.token).await;

        res.assert_error(400, "REJECTED");
        assert_eq!(res.body["message"], "Failed to complete challenge");
        assert_eq!(res.body["errors"], "User may not be participating in this challenge");
    }

    #[tokio::test]
    async fn second_completion_does_not_award_again() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let user = app.create_user("Ana").await;
        let id = app.create_challenge(&admin.token, "Mutirão", 40).await;
        app.post_empty(&routes::participate(id, user.id), &user.token).await;
        app.post_empty(&routes::complete(id, user.id), &user.token).await;

        let res = app.post_empty(&routes::complete(id, user.id), &user.token).await;
        res.assert_error(400, "REJECTED");

        let me = app.get_with_token(routes::ME, &user.token).await;
        assert_eq!(me.data()["score"], 40);
        let challenge = app.get_without_token(&routes::challenge(id)).await;
        assert_eq!(challenge.data()["checks"], 1);
    }

    #[tokio::test]
    async fn joining_twice_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let user = app.create_user("Ana").await;
        let id = app.create_challenge(&admin.token, "Mutirão", 40).await;
        app.post_empty(&routes::participate(id, user.id), &user.token).await;

        let res = app.post_empty(&routes::participate(id, user.id), &user.token).await;

        res.assert_error(400, "REJECTED");
        assert_eq!(res.body["errors"], "User may already be participating");
    }

    #[tokio::test]
    async fn user_cannot_join_on_behalf_of_someone_else() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let ana = app.create_user("Ana").await;
        let bruno = app.create_user("Bruno").await;
        let id = app.create_challenge(&admin.token, "Mutirão", 40).await;

        let res = app.post_empty(&routes::participate(id, bruno.id), &ana.token).await;

        res.assert_error(403, "PERMISSION_DENIED");
    }
}

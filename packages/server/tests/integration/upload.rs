use serde_json::json;

use crate::common::{SEEDED_INSTITUTION, TestApp, routes};

/// Smallest valid PNG: signature plus IHDR/IDAT/IEND chunks of a 1x1 pixel.
const PNG_1X1: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

#[tokio::test]
async fn image_upload_returns_a_public_path() {
    let app = TestApp::spawn().await;
    let user = app.create_user("Ana").await;

    let res = app
        .upload_image(routes::UPLOAD_IMAGE, "foto.png", "image/png", PNG_1X1.to_vec(), &user.token)
        .await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["message"], "Image uploaded successfully");
    let path = res.data().as_str().unwrap();
    assert!(path.starts_with("/uploads/"), "{path}");
    assert!(path.ends_with(".png"), "{path}");

    let file_name = path.rsplit('/').next().unwrap();
    assert!(app.upload_dir.join(file_name).exists());
}

#[tokio::test]
async fn non_image_upload_is_rejected() {
    let app = TestApp::spawn().await;
    let user = app.create_user("Ana").await;

    let res = app
        .upload_image(
            routes::UPLOAD_IMAGE,
            "notas.txt",
            "text/plain",
            b"not an image".to_vec(),
            &user.token,
        )
        .await;

    res.assert_error(400, "VALIDATION_ERROR");
}

#[tokio::test]
async fn upload_requires_a_token() {
    let app = TestApp::spawn().await;

    let res = app
        .upload_image(routes::UPLOAD_IMAGE, "foto.png", "image/png", PNG_1X1.to_vec(), "")
        .await;

    assert_eq!(res.status, 401, "{}", res.text);
}

#[tokio::test]
async fn oversized_image_is_rejected() {
    let app = TestApp::spawn_with_upload_limit(32).await;
    let user = app.create_user("Ana").await;

    let res = app
        .upload_image(routes::UPLOAD_IMAGE, "foto.png", "image/png", PNG_1X1.to_vec(), &user.token)
        .await;

    res.assert_error(400, "VALIDATION_ERROR");
}

#[tokio::test]
async fn course_image_is_stored_on_the_course() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin().await;
    let student = app.create_user("Bruno").await;
    let id = app.create_course(&admin.token, SEEDED_INSTITUTION, json!({})).await;

    let denied = app
        .upload_image(&routes::course_image(id), "capa.png", "image/png", PNG_1X1.to_vec(), &student.token)
        .await;
    denied.assert_error(403, "PERMISSION_DENIED");

    let res = app
        .upload_image(&routes::course_image(id), "capa.png", "image/png", PNG_1X1.to_vec(), &admin.token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    let path = res.data().as_str().unwrap().to_string();

    let course = app.get_with_token(&routes::course(id), &admin.token).await;
    assert_eq!(course.data()["image"], path);
}

#[tokio::test]
async fn health_reports_database_status() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::HEALTH).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["status"], "ok");
    assert_eq!(res.body["database"], true);
}

//! Integration tests for authentication endpoints

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::PASSWORD;
use fittrack_backend::repositories::PasswordResetRepository;
use serde_json::json;

#[tokio::test]
#[ignore = "requires database"]
async fn test_register_returns_token_pair() {
    let app = common::TestApp::new().await;
    let suffix = &uuid::Uuid::new_v4().simple().to_string()[..12];

    let body = json!({
        "email": format!("register_{}@example.com", suffix),
        "username": format!("register_{}", suffix),
        "password": PASSWORD,
    });
    let (status, response) = app.post("/api/v1/auth/register", &body).await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(!response["access_token"].as_str().unwrap().is_empty());
    assert!(!response["refresh_token"].as_str().unwrap().is_empty());
    assert_eq!(response["token_type"], "Bearer");
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_register_duplicate_email_and_username() {
    let app = common::TestApp::new().await;
    let user = app.create_test_user().await;

    let same_email = json!({
        "email": user.email,
        "username": format!("{}_x", user.username),
        "password": PASSWORD,
    });
    let (status, _) = app.post("/api/v1/auth/register", &same_email).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let same_username = json!({
        "email": format!("other_{}", user.email),
        "username": user.username,
        "password": PASSWORD,
    });
    let (status, _) = app.post("/api/v1/auth/register", &same_username).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_register_rejects_bad_input() {
    let app = common::TestApp::new().await;

    let bad_email = json!({ "email": "not-an-email", "username": "valid_name", "password": PASSWORD });
    let (status, _) = app.post("/api/v1/auth/register", &bad_email).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let weak = json!({ "email": "weak@example.com", "username": "weak_pw", "password": "123" });
    let (status, _) = app.post("/api/v1/auth/register", &weak).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let bad_username = json!({ "email": "name@example.com", "username": "a b", "password": PASSWORD });
    let (status, response) = app.post("/api/v1/auth/register", &bad_username).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"]["field"], "username");
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_login_with_email_or_username() {
    let app = common::TestApp::new().await;
    let user = app.create_test_user().await;

    for login in [&user.email, &user.username] {
        let (status, response) = app
            .post("/api/v1/auth/login", &json!({ "login": login, "password": PASSWORD }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(!response["access_token"].as_str().unwrap().is_empty());
    }
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_login_failures_share_one_message() {
    let app = common::TestApp::new().await;
    let user = app.create_test_user().await;

    let (status, wrong_password) = app
        .post("/api/v1/auth/login", &json!({ "login": user.email, "password": "WrongPassword1!" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, unknown_user) = app
        .post("/api/v1/auth/login", &json!({ "login": "nobody@example.com", "password": PASSWORD }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password["error"]["message"], unknown_user["error"]["message"]);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_refresh_rotates_and_detects_reuse() {
    let app = common::TestApp::new().await;
    let user = app.create_test_user().await;

    let (status, rotated) = app
        .post("/api/v1/auth/refresh", &json!({ "refresh_token": user.refresh_token }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let new_refresh = rotated["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(new_refresh, user.refresh_token);

    // Presenting the rotated-out token revokes every session
    let (status, _) = app
        .post("/api/v1/auth/refresh", &json!({ "refresh_token": user.refresh_token }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post("/api/v1/auth/refresh", &json!({ "refresh_token": new_refresh }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_logout_revokes_refresh_token() {
    let app = common::TestApp::new().await;
    let user = app.create_test_user().await;

    let (status, _) = app
        .post("/api/v1/auth/logout", &json!({ "refresh_token": user.refresh_token }))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .post("/api/v1/auth/refresh", &json!({ "refresh_token": user.refresh_token }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_change_password_requires_current_password() {
    let app = common::TestApp::new().await;
    let user = app.create_test_user().await;

    let (status, _) = app
        .post_auth(
            "/api/v1/auth/change-password",
            &json!({ "current_password": "NotMyPassword1!", "new_password": "BrandNewPassword1!" }),
            &user.access_token,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post_auth(
            "/api/v1/auth/change-password",
            &json!({ "current_password": PASSWORD, "new_password": "BrandNewPassword1!" }),
            &user.access_token,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/api/v1/auth/login",
            &json!({ "login": user.email, "password": "BrandNewPassword1!" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Existing sessions were revoked
    let (status, _) = app
        .post("/api/v1/auth/refresh", &json!({ "refresh_token": user.refresh_token }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_forgot_password_does_not_reveal_accounts() {
    let app = common::TestApp::new().await;
    let user = app.create_test_user().await;

    let (known, _) = app
        .post("/api/v1/auth/forgot-password", &json!({ "email": user.email }))
        .await;
    let (unknown, _) = app
        .post("/api/v1/auth/forgot-password", &json!({ "email": "ghost@example.com" }))
        .await;

    assert_eq!(known, StatusCode::ACCEPTED);
    assert_eq!(unknown, StatusCode::ACCEPTED);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_reset_password_rejects_garbage_token() {
    let app = common::TestApp::new().await;

    let (status, _) = app
        .post(
            "/api/v1/auth/reset-password",
            &json!({ "token": "not-a-token", "new_password": "BrandNewPassword1!" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_reset_password_is_single_use_and_revokes_sessions() {
    let app = common::TestApp::new().await;
    let user = app.create_test_user().await;

    let row = PasswordResetRepository::create(&app.pool, user.id, Utc::now() + Duration::hours(1))
        .await
        .unwrap();
    let token = common::test_jwt().generate_reset_token(user.id, row.id).unwrap();
    let body = json!({ "token": token, "new_password": "BrandNewPassword1!" });

    let (status, _) = app.post("/api/v1/auth/reset-password", &body).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post("/api/v1/auth/login", &json!({ "login": user.email, "password": PASSWORD }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app
        .post(
            "/api/v1/auth/login",
            &json!({ "login": user.email, "password": "BrandNewPassword1!" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Sessions opened before the reset are gone
    let (status, _) = app
        .post("/api/v1/auth/refresh", &json!({ "refresh_token": user.refresh_token }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let second = json!({ "token": token, "new_password": "AnotherPassword1!" });
    let (status, _) = app.post("/api/v1/auth/reset-password", &second).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_reset_token_for_another_user_is_rejected() {
    let app = common::TestApp::new().await;
    let owner = app.create_test_user().await;
    let other = app.create_test_user().await;

    let row = PasswordResetRepository::create(&app.pool, owner.id, Utc::now() + Duration::hours(1))
        .await
        .unwrap();
    let token = common::test_jwt().generate_reset_token(other.id, row.id).unwrap();

    let (status, _) = app
        .post(
            "/api/v1/auth/reset-password",
            &json!({ "token": token, "new_password": "BrandNewPassword1!" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

//! Integration tests for weight tracking endpoints

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

#[tokio::test]
#[ignore = "requires database"]
async fn test_log_weight_requires_auth() {
    let app = common::TestApp::new().await;

    let (status, _) = app.post("/api/v1/weight", &json!({ "weight": 75.5 })).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_log_weight_converts_units_and_syncs_profile() {
    let app = common::TestApp::new().await;
    let user = app.create_test_user().await;

    let (status, record) = app
        .post_auth(
            "/api/v1/weight",
            &json!({ "weight": 165.0, "unit": "lbs" }),
            &user.access_token,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(record["weight_kg"], 74.84);

    let (_, profile) = app.get_auth("/api/v1/users/me", &user.access_token).await;
    assert_eq!(profile["weight_kg"], 74.84);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_same_day_entry_replaces_previous() {
    let app = common::TestApp::new().await;
    let user = app.create_test_user().await;

    for weight in [80.0, 79.5] {
        app.post_auth(
            "/api/v1/weight",
            &json!({ "weight": weight, "recorded_on": "2025-05-01" }),
            &user.access_token,
        )
        .await;
    }

    let (status, history) = app
        .get_auth("/api/v1/weight?start=2025-05-01&end=2025-05-01", &user.access_token)
        .await;
    assert_eq!(status, StatusCode::OK);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["weight_kg"], 79.5);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_future_dates_are_rejected() {
    let app = common::TestApp::new().await;
    let user = app.create_test_user().await;
    let tomorrow = Utc::now().date_naive() + Duration::days(1);

    let (status, body) = app
        .post_auth(
            "/api/v1/weight",
            &json!({ "weight": 80.0, "recorded_on": tomorrow }),
            &user.access_token,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "recorded_on");
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_progress_fills_gaps_and_reports_target() {
    let app = common::TestApp::new().await;
    let user = app.create_test_user().await;
    app.complete_profile(&user.access_token).await;

    for (day, weight) in [("2025-01-01", 82.0), ("2025-01-04", 81.0), ("2025-01-07", 80.0)] {
        let (status, _) = app
            .post_auth(
                "/api/v1/weight",
                &json!({ "weight": weight, "recorded_on": day }),
                &user.access_token,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, progress) = app
        .get_auth(
            "/api/v1/weight/progress?start=2025-01-01&end=2025-01-07",
            &user.access_token,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", progress);

    let points = progress["points"].as_array().unwrap();
    assert_eq!(points.len(), 7);
    assert_eq!(points[1]["weight_kg"], 82.0);
    assert_eq!(points[1]["recorded"], false);
    assert_eq!(progress["start_weight_kg"], 82.0);
    assert_eq!(progress["current_weight_kg"], 80.0);
    assert_eq!(progress["change_kg"], -2.0);
    assert_eq!(progress["target_weight_kg"], 75.0);
    assert_eq!(progress["remaining_to_target_kg"], -5.0);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_delete_record_resyncs_profile_weight() {
    let app = common::TestApp::new().await;
    let user = app.create_test_user().await;

    app.post_auth(
        "/api/v1/weight",
        &json!({ "weight": 90.0, "recorded_on": "2025-02-01" }),
        &user.access_token,
    )
    .await;
    let (_, latest) = app
        .post_auth(
            "/api/v1/weight",
            &json!({ "weight": 88.0, "recorded_on": "2025-02-10" }),
            &user.access_token,
        )
        .await;

    let path = format!("/api/v1/weight/{}", latest["id"].as_str().unwrap());
    let (status, _) = app.delete_auth(&path, &user.access_token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, profile) = app.get_auth("/api/v1/users/me", &user.access_token).await;
    assert_eq!(profile["weight_kg"], 90.0);

    let (status, _) = app.delete_auth(&path, &user.access_token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_deleting_last_record_clears_profile_weight() {
    let app = common::TestApp::new().await;
    let user = app.create_test_user().await;

    let (_, record) = app
        .post_auth(
            "/api/v1/weight",
            &json!({ "weight": 81.0, "recorded_on": "2025-03-01" }),
            &user.access_token,
        )
        .await;
    let (_, profile) = app.get_auth("/api/v1/users/me", &user.access_token).await;
    assert_eq!(profile["weight_kg"], 81.0);

    let path = format!("/api/v1/weight/{}", record["id"].as_str().unwrap());
    let (status, _) = app.delete_auth(&path, &user.access_token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, profile) = app.get_auth("/api/v1/users/me", &user.access_token).await;
    assert!(profile["weight_kg"].is_null());
}

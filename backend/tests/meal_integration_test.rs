//! Integration tests for meals and nutrition

mod common;

use axum::http::StatusCode;
use chrono::Utc;
use serde_json::json;

#[tokio::test]
#[ignore = "requires database"]
async fn test_create_meal_and_list_by_date() {
    let app = common::TestApp::new().await;
    let user = app.create_test_user().await;

    let (status, meal) = app
        .post_auth(
            "/api/v1/meals",
            &json!({
                "name": "Chicken salad",
                "meal_type": "lunch",
                "calories": 450.0,
                "protein_g": 35.0,
                "carbs_g": 20.0,
                "fat_g": 18.0,
                "eaten_on": "2025-03-10",
            }),
            &user.access_token,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", meal);
    assert_eq!(meal["meal_type"], "lunch");

    let (status, meals) = app.get_auth("/api/v1/meals?date=2025-03-10", &user.access_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(meals.as_array().unwrap().len(), 1);

    let (_, other_day) = app.get_auth("/api/v1/meals?date=2025-03-11", &user.access_token).await;
    assert!(other_day.as_array().unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_negative_macros_are_rejected() {
    let app = common::TestApp::new().await;
    let user = app.create_test_user().await;

    let (status, body) = app
        .post_auth(
            "/api/v1/meals",
            &json!({
                "name": "Broken",
                "meal_type": "snack",
                "calories": 100.0,
                "protein_g": -1.0,
                "carbs_g": 0.0,
                "fat_g": 0.0,
            }),
            &user.access_token,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_log_from_item_scales_nutrients() {
    let app = common::TestApp::new().await;
    let user = app.create_test_user().await;
    let oatmeal = app.item_id("Oatmeal").await;

    let (status, meal) = app
        .post_auth(
            "/api/v1/meals/from-item",
            &json!({ "consumable_item_id": oatmeal, "quantity_g": 80.0, "meal_type": "breakfast" }),
            &user.access_token,
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{}", meal);
    assert_eq!(meal["name"], "Oatmeal");
    assert_eq!(meal["calories"], 300.0);
    assert_eq!(meal["protein_g"], 10.6);
    assert_eq!(meal["carbs_g"], 54.0);
    assert_eq!(meal["fat_g"], 5.2);
    assert_eq!(meal["quantity_g"], 80.0);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_meals_are_private_to_owner() {
    let app = common::TestApp::new().await;
    let owner = app.create_test_user().await;
    let other = app.create_test_user().await;
    let banana = app.item_id("Banana").await;

    let (_, meal) = app
        .post_auth(
            "/api/v1/meals/from-item",
            &json!({ "consumable_item_id": banana, "quantity_g": 118.0, "meal_type": "snack" }),
            &owner.access_token,
        )
        .await;
    let path = format!("/api/v1/meals/{}", meal["id"].as_str().unwrap());

    let (status, _) = app
        .put_auth(&path, &json!({ "calories": 1.0 }), &other.access_token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, updated) = app
        .put_auth(&path, &json!({ "name": "Big banana" }), &owner.access_token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Big banana");
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_meal_summary_groups_by_type() {
    let app = common::TestApp::new().await;
    let user = app.create_test_user().await;

    for (meal_type, calories) in [("breakfast", 300.0), ("lunch", 500.0), ("lunch", 200.0)] {
        app.post_auth(
            "/api/v1/meals",
            &json!({
                "name": "Food",
                "meal_type": meal_type,
                "calories": calories,
                "protein_g": 10.0,
                "carbs_g": 10.0,
                "fat_g": 10.0,
                "eaten_on": "2025-04-01",
            }),
            &user.access_token,
        )
        .await;
    }

    let (status, summary) = app
        .get_auth("/api/v1/meals/summary?date=2025-04-01", &user.access_token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["meal_count"], 3);
    assert_eq!(summary["totals"]["calories"], 1000.0);
    assert_eq!(summary["by_meal_type"].as_array().unwrap().len(), 2);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_item_search_and_detail() {
    let app = common::TestApp::new().await;
    let user = app.create_test_user().await;

    let (status, items) = app
        .get_auth("/api/v1/nutrition/items?q=chick", &user.access_token)
        .await;
    assert_eq!(status, StatusCode::OK);
    let first = &items.as_array().unwrap()[0];
    assert_eq!(first["name"], "Chicken Breast");

    let (status, detail) = app
        .get_auth(
            &format!("/api/v1/nutrition/items/{}", first["id"].as_str().unwrap()),
            &user.access_token,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(detail["nutrients"].as_array().unwrap().len() >= 3);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_daily_nutrition_balances_intake_and_exercise() {
    let app = common::TestApp::new().await;
    let user = app.create_test_user().await;
    app.complete_profile(&user.access_token).await;
    let today = Utc::now().date_naive();
    let yoga = app.activity_type_id("Yoga").await;

    app.post_auth(
        "/api/v1/meals",
        &json!({
            "name": "Dinner",
            "meal_type": "dinner",
            "calories": 800.0,
            "protein_g": 40.0,
            "carbs_g": 80.0,
            "fat_g": 30.0,
        }),
        &user.access_token,
    )
    .await;
    app.post_auth(
        "/api/v1/activities",
        &json!({ "activity_type_id": yoga, "duration_minutes": 30, "calories_burned": 200.0 }),
        &user.access_token,
    )
    .await;

    let (status, body) = app
        .get_auth(&format!("/api/v1/nutrition/daily?date={}", today), &user.access_token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intake"]["calories"], 800.0);
    assert_eq!(body["calories_burned"], 200.0);
    assert_eq!(body["net_calories"], 600.0);
    assert!(body["calorie_target"].as_f64().is_some());
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_daily_nutrition_without_profile_has_no_target() {
    let app = common::TestApp::new().await;
    let user = app.create_test_user().await;

    let (status, body) = app.get_auth("/api/v1/nutrition/daily", &user.access_token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("calorie_target").is_none());
}

//! Meal log routes

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::MealService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use fittrack_shared::types::{
    CreateMealRequest, DateQuery, LogMealFromItemRequest, MealResponse, MealSummaryResponse,
    UpdateMealRequest,
};
use uuid::Uuid;

pub fn meal_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_meals).post(create_meal))
        .route("/from-item", post(log_from_item))
        .route("/summary", get(daily_summary))
        .route("/:id", get(get_meal).put(update_meal).delete(delete_meal))
}

/// GET /api/v1/meals?date
///
/// Meals of one day (today by default), breakfast first.
async fn list_meals(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<Vec<MealResponse>>> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let meals = MealService::list_meals(&state.db, auth.user_id, date).await?;
    Ok(Json(meals))
}

async fn create_meal(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateMealRequest>,
) -> ApiResult<(StatusCode, Json<MealResponse>)> {
    let meal = MealService::create_meal(&state.db, auth.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(meal)))
}

/// POST /api/v1/meals/from-item
async fn log_from_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<LogMealFromItemRequest>,
) -> ApiResult<(StatusCode, Json<MealResponse>)> {
    let meal = MealService::log_from_item(&state.db, auth.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(meal)))
}

async fn daily_summary(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<MealSummaryResponse>> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let summary = MealService::daily_summary(&state.db, auth.user_id, date).await?;
    Ok(Json(summary))
}

async fn get_meal(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MealResponse>> {
    let meal = MealService::get_meal(&state.db, auth.user_id, id).await?;
    Ok(Json(meal))
}

async fn update_meal(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateMealRequest>,
) -> ApiResult<Json<MealResponse>> {
    let meal = MealService::update_meal(&state.db, auth.user_id, id, req).await?;
    Ok(Json(meal))
}

async fn delete_meal(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    MealService::delete_meal(&state.db, auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

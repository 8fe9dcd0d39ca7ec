//! Activity log and activity catalog routes

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::ActivityService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use fittrack_shared::types::{
    ActivityCategoryResponse, ActivityResponse, ActivitySummaryResponse, ActivityTypeResponse,
    ActivityTypesQuery, CalorieEstimateResponse, DateQuery, DateRangeQuery,
    EstimateCaloriesRequest, LogActivityRequest, UpdateActivityRequest,
};
use uuid::Uuid;

pub fn activity_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_activities).post(log_activity))
        .route("/estimate", post(estimate_calories))
        .route("/summary", get(daily_summary))
        .route("/categories", get(list_categories))
        .route("/types", get(list_types))
        .route(
            "/:id",
            get(get_activity).put(update_activity).delete(delete_activity),
        )
}

/// GET /api/v1/activities?start&end
async fn list_activities(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(range): Query<DateRangeQuery>,
) -> ApiResult<Json<Vec<ActivityResponse>>> {
    let activities =
        ActivityService::list_activities(&state.db, auth.user_id, range.start, range.end).await?;
    Ok(Json(activities))
}

/// POST /api/v1/activities
///
/// Calories are estimated from MET values when not given.
async fn log_activity(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<LogActivityRequest>,
) -> ApiResult<(StatusCode, Json<ActivityResponse>)> {
    let activity = ActivityService::log_activity(&state.db, auth.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(activity)))
}

/// POST /api/v1/activities/estimate
async fn estimate_calories(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<EstimateCaloriesRequest>,
) -> ApiResult<Json<CalorieEstimateResponse>> {
    let estimate = ActivityService::calculate_exercise_calories(
        &state.db,
        auth.user_id,
        req.activity_type_id,
        req.duration_minutes,
    )
    .await?;
    Ok(Json(estimate))
}

/// GET /api/v1/activities/summary?date
async fn daily_summary(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<ActivitySummaryResponse>> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let summary = ActivityService::daily_summary(&state.db, auth.user_id, date).await?;
    Ok(Json(summary))
}

/// GET /api/v1/activities/categories
async fn list_categories(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> ApiResult<Json<Vec<ActivityCategoryResponse>>> {
    let categories = ActivityService::list_categories(&state.db, &state.cache).await?;
    Ok(Json(categories.as_ref().clone()))
}

/// GET /api/v1/activities/types?category_id
async fn list_types(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ActivityTypesQuery>,
) -> ApiResult<Json<Vec<ActivityTypeResponse>>> {
    let types = ActivityService::list_types(&state.db, &state.cache, query.category_id).await?;
    Ok(Json(types.as_ref().clone()))
}

async fn get_activity(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ActivityResponse>> {
    let activity = ActivityService::get_activity(&state.db, auth.user_id, id).await?;
    Ok(Json(activity))
}

async fn update_activity(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateActivityRequest>,
) -> ApiResult<Json<ActivityResponse>> {
    let activity = ActivityService::update_activity(&state.db, auth.user_id, id, req).await?;
    Ok(Json(activity))
}

async fn delete_activity(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    ActivityService::delete_activity(&state.db, auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

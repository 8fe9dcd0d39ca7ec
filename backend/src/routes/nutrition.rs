//! Food catalog and daily nutrition routes

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::NutritionService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use fittrack_shared::types::{
    ConsumableItemResponse, ConsumableItemSummary, DailyNutritionResponse, DateQuery,
    ItemSearchQuery,
};
use uuid::Uuid;

pub fn nutrition_routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(search_items))
        .route("/items/:id", get(get_item))
        .route("/daily", get(daily_nutrition))
}

/// GET /api/v1/nutrition/items?q&limit
async fn search_items(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ItemSearchQuery>,
) -> ApiResult<Json<Vec<ConsumableItemSummary>>> {
    let items =
        NutritionService::search_items(&state.db, &state.cache, query.q.as_deref(), query.limit)
            .await?;
    Ok(Json(items))
}

/// GET /api/v1/nutrition/items/:id
async fn get_item(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ConsumableItemResponse>> {
    let item = NutritionService::get_item(&state.db, id).await?;
    Ok(Json(item))
}

/// GET /api/v1/nutrition/daily?date
async fn daily_nutrition(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<DailyNutritionResponse>> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let balance = NutritionService::daily_nutrition(&state.db, auth.user_id, date).await?;
    Ok(Json(balance))
}

//! Weight tracking routes

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::services::WeightService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use chrono::{Duration, Utc};
use fittrack_shared::types::{
    DateRangeQuery, LogWeightRequest, WeightProgressResponse, WeightRecordResponse,
};
use uuid::Uuid;

/// Progress range when the client gives no start
const DEFAULT_PROGRESS_DAYS: i64 = 30;

pub fn weight_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(history).post(log_weight))
        .route("/progress", get(progress))
        .route("/:id", delete(delete_record))
}

/// POST /api/v1/weight
///
/// `unit` may be kg, lbs or stone; storage is always kg. A second entry
/// for the same day replaces the first.
async fn log_weight(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<LogWeightRequest>,
) -> ApiResult<(StatusCode, Json<WeightRecordResponse>)> {
    let record = WeightService::log_weight(state.db(), auth.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/v1/weight?start&end
async fn history(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(range): Query<DateRangeQuery>,
) -> ApiResult<Json<Vec<WeightRecordResponse>>> {
    let records = WeightService::history(state.db(), auth.user_id, range.start, range.end).await?;
    Ok(Json(records))
}

/// GET /api/v1/weight/progress?start&end
///
/// Defaults to the last 30 days ending today.
async fn progress(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(range): Query<DateRangeQuery>,
) -> ApiResult<Json<WeightProgressResponse>> {
    let end = range.end.unwrap_or_else(|| Utc::now().date_naive());
    let start = match range.start {
        Some(start) => start,
        None => end
            .checked_sub_signed(Duration::days(DEFAULT_PROGRESS_DAYS - 1))
            .ok_or_else(|| ApiError::BadRequest("end is out of range".to_string()))?,
    };

    let progress = WeightService::get_weight_progress(state.db(), auth.user_id, start, end).await?;
    Ok(Json(progress))
}

async fn delete_record(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    WeightService::delete_record(state.db(), auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

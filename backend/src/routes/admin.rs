//! Administration routes
//!
//! Every handler takes `AdminUser`, so non-admin tokens get 403.

use crate::auth::AdminUser;
use crate::error::ApiResult;
use crate::services::{AdminService, NutritionService};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use fittrack_shared::types::{
    ActivityCategoryResponse, ActivityTypeResponse, AdminStatsResponse, AdminUserSummary,
    AdminUsersQuery, ConsumableItemResponse, CreateActivityCategoryRequest,
    CreateActivityTypeRequest, CreateConsumableItemRequest, PaginatedResponse, SeedReport,
    UpdateRoleRequest, UserProfileResponse,
};
use uuid::Uuid;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user).delete(delete_user))
        .route("/users/:id/role", put(set_role))
        .route("/stats", get(stats))
        .route("/categories", post(create_category))
        .route("/types", post(create_activity_type))
        .route("/items", post(create_item))
        .route("/items/:id", delete(delete_item))
        .route("/seed", post(run_seeder))
}

/// GET /api/v1/admin/users?search&page&per_page
async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<AdminUsersQuery>,
) -> ApiResult<Json<PaginatedResponse<AdminUserSummary>>> {
    let page = AdminService::list_users(&state.db, query).await?;
    Ok(Json(page))
}

async fn get_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserProfileResponse>> {
    let user = AdminService::get_user(&state.db, id).await?;
    Ok(Json(user))
}

async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    AdminService::delete_user(&state.db, state.storage.as_ref(), admin.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/admin/users/:id/role
async fn set_role(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRoleRequest>,
) -> ApiResult<Json<UserProfileResponse>> {
    let user = AdminService::set_role(&state.db, admin.user_id, id, req.role).await?;
    Ok(Json(user))
}

async fn stats(State(state): State<AppState>, _admin: AdminUser) -> ApiResult<Json<AdminStatsResponse>> {
    let stats = AdminService::stats(&state.db).await?;
    Ok(Json(stats))
}

async fn create_category(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(req): Json<CreateActivityCategoryRequest>,
) -> ApiResult<(StatusCode, Json<ActivityCategoryResponse>)> {
    let category = AdminService::create_category(&state.db, &state.cache, req).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn create_activity_type(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(req): Json<CreateActivityTypeRequest>,
) -> ApiResult<(StatusCode, Json<ActivityTypeResponse>)> {
    let activity_type = AdminService::create_activity_type(&state.db, &state.cache, req).await?;
    Ok((StatusCode::CREATED, Json(activity_type)))
}

async fn create_item(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(req): Json<CreateConsumableItemRequest>,
) -> ApiResult<(StatusCode, Json<ConsumableItemResponse>)> {
    let item = NutritionService::create_item(&state.db, &state.cache, req).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn delete_item(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    NutritionService::delete_item(&state.db, &state.cache, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/admin/seed
async fn run_seeder(State(state): State<AppState>, _admin: AdminUser) -> ApiResult<Json<SeedReport>> {
    let report = AdminService::run_seeder(&state.db, &state.cache, &state.config().seed).await?;
    Ok(Json(report))
}

//! Current user profile routes

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::services::user::PictureUpload;
use crate::services::UserService;
use crate::state::AppState;
use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use fittrack_shared::types::{
    DailyTargetsResponse, ProfilePictureResponse, UpdateProfileRequest, UserProfileResponse,
};

/// Multipart framing allowance on top of the image itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn user_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/me", get(get_profile).put(update_profile).delete(delete_account))
        .route("/me/targets", get(get_targets))
        .route(
            "/me/picture",
            post(upload_picture).layer(DefaultBodyLimit::max(max_upload_bytes + MULTIPART_OVERHEAD_BYTES)),
        )
}

/// GET /api/v1/users/me
async fn get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<UserProfileResponse>> {
    let profile = UserService::get_profile(&state.db, auth.user_id).await?;
    Ok(Json(profile))
}

/// PUT /api/v1/users/me
///
/// Weight and height may be sent with `weight_unit` / `height_unit`.
async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<UserProfileResponse>> {
    let profile = UserService::update_profile(&state.db, auth.user_id, req).await?;
    Ok(Json(profile))
}

/// DELETE /api/v1/users/me
async fn delete_account(State(state): State<AppState>, auth: AuthUser) -> ApiResult<StatusCode> {
    UserService::delete_account(&state.db, state.storage.as_ref(), auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/users/me/targets
async fn get_targets(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<DailyTargetsResponse>> {
    let targets = UserService::daily_targets(&state.db, auth.user_id).await?;
    Ok(Json(targets))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("Upload exceeds the size limit".to_string())
    } else {
        ApiError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
    }
}

/// POST /api/v1/users/me/picture
///
/// Multipart body with the image in a field named `file`.
async fn upload_picture(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> ApiResult<Json<ProfilePictureResponse>> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("picture").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;

        upload = Some(PictureUpload {
            bytes: bytes.to_vec(),
            file_name,
            content_type,
        });
        break;
    }

    let upload = upload.ok_or_else(|| ApiError::invalid_field("file", "Missing file field"))?;
    let response = UserService::upload_profile_picture(
        &state.db,
        state.storage.as_ref(),
        state.config().storage.max_upload_bytes,
        auth.user_id,
        upload,
    )
    .await?;

    Ok(Json(response))
}

//! Route definitions for the FitTrack API
//!
//! This module organizes all API routes and applies middleware.

use crate::state::AppState;
use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

mod activities;
mod admin;
mod auth;
mod health;
mod meals;
mod nutrition;
mod users;
mod weight;

#[cfg(test)]
mod auth_tests;

pub use activities::activity_routes;
pub use admin::admin_routes;
pub use auth::auth_routes;
pub use meals::meal_routes;
pub use nutrition::nutrition_routes;
pub use users::user_routes;
pub use weight::weight_routes;

/// Create the main application router with all middleware
pub fn create_router(state: AppState) -> Router {
    let storage = &state.config().storage;
    let mut router = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .route("/metrics", get(health::metrics))
        .nest("/api/v1", api_routes(storage.max_upload_bytes));

    // Pictures kept on local disk are served by the API itself
    if storage.provider == "local" {
        router = router.nest_service("/uploads", ServeDir::new(&storage.local_dir));
    }

    router
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

/// API v1 routes
fn api_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { "FitTrack API v1" }))
        .nest("/auth", auth_routes())
        .nest("/users", user_routes(max_upload_bytes))
        .nest("/activities", activity_routes())
        .nest("/meals", meal_routes())
        .nest("/nutrition", nutrition_routes())
        .nest("/weight", weight_routes())
        .nest("/admin", admin_routes())
}

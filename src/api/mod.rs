pub mod media;

use axum::extract::DefaultBodyLimit;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use crate::error::ApiError;
use crate::state::AppState;

/// Media routes are mounted at `base_path` (`/` mounts them at the root).
pub fn router(base_path: &str, max_upload_bytes: usize) -> Router<AppState> {
    let media = media::routes(base_path).layer(DefaultBodyLimit::max(max_upload_bytes));

    Router::new()
        .route("/health", get(health_check))
        .merge(media)
        .fallback(fallback)
}

async fn health_check() -> impl IntoResponse {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

async fn fallback() -> ApiError {
    ApiError::NotFound("Route")
}

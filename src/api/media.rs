use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use uuid::Uuid;

use crate::error::ApiError;
use crate::services::{ingest, uploads};
use crate::state::AppState;

/// Collection routes answer both `{base}` and `{base}/`.
pub fn routes(base_path: &str) -> Router<AppState> {
    let prefix = match base_path.trim_matches('/') {
        "" => String::new(),
        base => format!("/{base}"),
    };
    let collection = || get(list_media).post(upload_media);

    let router = Router::new().route(&format!("{prefix}/"), collection());
    let router = if prefix.is_empty() {
        router
    } else {
        router.route(&prefix, collection())
    };

    router.route(&format!("{prefix}/{{media_id}}"), get(get_media))
}

/// POST {base}
async fn upload_media(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let multipart = multipart.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(e.body_text())
        } else {
            ApiError::InvalidInput(e.body_text())
        }
    })?;
    let form = uploads::extract_upload_form(multipart).await?;

    let record = ingest::ingest_upload(&state, form).await?;
    Ok(Json(record))
}

/// GET {base}
async fn list_media(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let media = state.media.list().await?;
    Ok(Json(media))
}

/// GET {base}/:media_id
///
/// An unknown id yields `null` rather than a 404.
async fn get_media(
    State(state): State<AppState>,
    Path(media_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let media_id = Uuid::parse_str(&media_id)
        .map_err(|_| ApiError::InvalidInput(format!("Invalid media id: {media_id}")))?;

    let media = state.media.get(media_id).await?;
    Ok(Json(media))
}

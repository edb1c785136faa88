use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::services::assets::AssetError;

/// Coarse failure category, exposed to callers so they can branch without
/// parsing the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Upstream,
    NotFound,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),

    #[error("asset upload failed: {0}")]
    Asset(#[from] AssetError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::InvalidInput(_) | ApiError::PayloadTooLarge(_) => ErrorKind::Validation,
            ApiError::Asset(_) | ApiError::Database(_) | ApiError::Internal(_) => {
                ErrorKind::Upstream
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Validation and upstream failures both answer 500; `kind` tells them apart.
        let kind = self.kind();
        let (status, code) = match (&self, kind) {
            (ApiError::PayloadTooLarge(_), _) => (StatusCode::PAYLOAD_TOO_LARGE, 41300),
            (_, ErrorKind::NotFound) => (StatusCode::NOT_FOUND, 40004),
            (_, ErrorKind::Validation) => (StatusCode::INTERNAL_SERVER_ERROR, 40000),
            (_, ErrorKind::Upstream) => {
                tracing::error!(error = %self, "Upstream error");
                (StatusCode::INTERNAL_SERVER_ERROR, 50000)
            }
        };

        let body = json!({
            "error": self.to_string(),
            "kind": kind,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(ApiError::NotFound("Route").kind(), ErrorKind::NotFound);
        assert_eq!(
            ApiError::InvalidInput("Missing video file".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            ApiError::PayloadTooLarge("length limit exceeded".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            ApiError::Database(sqlx::Error::PoolTimedOut).kind(),
            ErrorKind::Upstream
        );
        assert_eq!(
            ApiError::Asset(AssetError::Rejected("quota".into())).kind(),
            ErrorKind::Upstream
        );
    }

    #[test]
    fn test_status_codes() {
        let resp = ApiError::InvalidInput("bad".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = ApiError::PayloadTooLarge("length limit exceeded".into()).into_response();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let resp = ApiError::Database(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = ApiError::NotFound("Route").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_upstream_message_is_surfaced() {
        let err = ApiError::Asset(AssetError::Rejected("Invalid image file".into()));
        assert_eq!(
            err.to_string(),
            "asset upload failed: provider rejected request: Invalid image file"
        );
    }
}

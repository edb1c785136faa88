use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ── Media ──────────────────────────────────────────────

/// Stored metadata for one uploaded thumbnail/video pair. Only created once
/// both assets are hosted, so both URLs are always set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub video_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMediaRecord {
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub video_url: String,
}

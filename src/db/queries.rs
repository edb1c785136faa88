use sqlx::PgPool;
use uuid::Uuid;

use crate::types::entities::{MediaRecord, NewMediaRecord};

// ── Media ──────────────────────────────────────────────

pub async fn create_media(
    pool: &PgPool,
    id: Uuid,
    media: &NewMediaRecord,
) -> Result<MediaRecord, sqlx::Error> {
    sqlx::query_as::<_, MediaRecord>(
        r#"
        INSERT INTO media (id, title, description, thumbnail_url, video_url)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, title, description, thumbnail_url, video_url, created_at
        "#,
    )
    .bind(id)
    .bind(&media.title)
    .bind(&media.description)
    .bind(&media.thumbnail_url)
    .bind(&media.video_url)
    .fetch_one(pool)
    .await
}

pub async fn list_media(pool: &PgPool) -> Result<Vec<MediaRecord>, sqlx::Error> {
    sqlx::query_as::<_, MediaRecord>(
        r#"
        SELECT id, title, description, thumbnail_url, video_url, created_at
        FROM media
        ORDER BY created_at, id
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn get_media_by_id(pool: &PgPool, id: Uuid) -> Result<Option<MediaRecord>, sqlx::Error> {
    sqlx::query_as::<_, MediaRecord>(
        r#"
        SELECT id, title, description, thumbnail_url, video_url, created_at
        FROM media WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

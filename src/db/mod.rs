pub mod queries;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::types::entities::{MediaRecord, NewMediaRecord};

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Persistence for media records. The store assigns ids and creation times.
#[async_trait]
pub trait MediaRepository: Send + Sync {
    async fn create(&self, media: NewMediaRecord) -> Result<MediaRecord, sqlx::Error>;

    /// All records in store order (oldest first).
    async fn list(&self) -> Result<Vec<MediaRecord>, sqlx::Error>;

    async fn get(&self, id: Uuid) -> Result<Option<MediaRecord>, sqlx::Error>;
}

pub struct PgMediaRepository {
    pool: PgPool,
}

impl PgMediaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MediaRepository for PgMediaRepository {
    async fn create(&self, media: NewMediaRecord) -> Result<MediaRecord, sqlx::Error> {
        queries::create_media(&self.pool, Uuid::now_v7(), &media).await
    }

    async fn list(&self) -> Result<Vec<MediaRecord>, sqlx::Error> {
        queries::list_media(&self.pool).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<MediaRecord>, sqlx::Error> {
        queries::get_media_by_id(&self.pool, id).await
    }
}

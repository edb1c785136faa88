use anyhow::Context;

use crate::error::ApiError;
use crate::services::assets::{AssetStore, ResourceKind, StoredAsset};
use crate::services::uploads::UploadForm;
use crate::state::AppState;
use crate::types::entities::{MediaRecord, NewMediaRecord};

/// Stage both files in scratch storage, push them to the asset store
/// concurrently, then persist the record. Scratch files are removed on every
/// exit path; remote assets from a failed run are deleted again.
pub async fn ingest_upload(state: &AppState, form: UploadForm) -> Result<MediaRecord, ApiError> {
    let UploadForm {
        title,
        description,
        thumbnail,
        video,
    } = form;

    let thumbnail_file = state
        .scratch
        .write(&thumbnail.file_name, &thumbnail.data)
        .await
        .context("failed to write thumbnail to scratch storage")?;
    let video_file = state
        .scratch
        .write(&video.file_name, &video.data)
        .await
        .context("failed to write video to scratch storage")?;

    let (thumbnail_result, video_result) = tokio::join!(
        state.assets.upload(
            thumbnail_file.path(),
            &thumbnail.content_type,
            ResourceKind::Image
        ),
        state
            .assets
            .upload(video_file.path(), &video.content_type, ResourceKind::Video),
    );

    let (thumbnail_asset, video_asset) = match (thumbnail_result, video_result) {
        (Ok(t), Ok(v)) => (t, v),
        (Ok(uploaded), Err(e)) | (Err(e), Ok(uploaded)) => {
            compensate(state.assets.as_ref(), &[uploaded]).await;
            return Err(e.into());
        }
        (Err(e), Err(other)) => {
            tracing::warn!(error = %other, "Video upload also failed");
            return Err(e.into());
        }
    };

    let new_media = NewMediaRecord {
        title,
        description,
        thumbnail_url: thumbnail_asset.secure_url.clone(),
        video_url: video_asset.secure_url.clone(),
    };

    let record = match state.media.create(new_media).await {
        Ok(record) => record,
        Err(e) => {
            compensate(state.assets.as_ref(), &[thumbnail_asset, video_asset]).await;
            return Err(e.into());
        }
    };

    tracing::info!(
        media_id = %record.id,
        thumbnail = %record.thumbnail_url,
        video = %record.video_url,
        "Media uploaded"
    );

    Ok(record)
}

/// Best-effort removal of assets left behind by a failed upload.
async fn compensate(assets: &dyn AssetStore, uploaded: &[StoredAsset]) {
    for asset in uploaded {
        match assets.delete(asset).await {
            Ok(()) => {
                tracing::info!(public_id = %asset.public_id, kind = %asset.kind, "Orphaned asset removed")
            }
            Err(e) => tracing::warn!(
                public_id = %asset.public_id,
                kind = %asset.kind,
                error = %e,
                "Failed to remove orphaned asset"
            ),
        }
    }
}

use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;

use crate::config::S3Config;
use crate::services::assets::{AssetError, AssetStore, ResourceKind, StoredAsset};

/// S3/MinIO-backed asset store. Objects are served from `public_url`.
pub struct S3Store {
    client: aws_sdk_s3::Client,
    config: S3Config,
}

impl S3Store {
    pub fn new(client: aws_sdk_s3::Client, config: S3Config) -> Self {
        Self { client, config }
    }

    pub async fn connect(config: S3Config) -> Self {
        let creds = aws_credential_types::Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "media-upload",
        );
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .endpoint_url(&config.endpoint)
            .region(aws_config::Region::new(config.region.clone()))
            .credentials_provider(creds)
            .load()
            .await;

        Self::new(aws_sdk_s3::Client::new(&sdk_config), config)
    }

    fn public_url(&self, object_key: &str) -> String {
        format!(
            "{}/{}",
            self.config.public_url.trim_end_matches('/'),
            object_key
        )
    }
}

pub fn object_key(kind: ResourceKind, file_name: &str) -> String {
    format!("media/{}/{}", kind, file_name)
}

#[async_trait]
impl AssetStore for S3Store {
    async fn upload(
        &self,
        path: &Path,
        content_type: &str,
        kind: ResourceKind,
    ) -> Result<StoredAsset, AssetError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload");
        let key = object_key(kind, file_name);

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| AssetError::Io(std::io::Error::other(e)))?;

        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&key)
            .content_type(content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| AssetError::Transport(DisplayErrorContext(e).to_string()))?;

        Ok(StoredAsset {
            secure_url: self.public_url(&key),
            public_id: key,
            kind,
        })
    }

    async fn delete(&self, asset: &StoredAsset) -> Result<(), AssetError> {
        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(&asset.public_id)
            .send()
            .await
            .map_err(|e| AssetError::Transport(DisplayErrorContext(e).to_string()))?;
        Ok(())
    }
}

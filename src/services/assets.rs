use std::fmt;
use std::path::Path;

use async_trait::async_trait;

/// Resource type tag sent to the object store with each upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Image,
    Video,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Image => "image",
            ResourceKind::Video => "video",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hosted asset: the provider's handle plus its public URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    pub public_id: String,
    pub secure_url: String,
    pub kind: ResourceKind,
}

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read scratch file: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage provider unreachable: {0}")]
    Transport(String),

    #[error("provider rejected request: {0}")]
    Rejected(String),
}

/// Remote object store holding the binary assets.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn upload(
        &self,
        path: &Path,
        content_type: &str,
        kind: ResourceKind,
    ) -> Result<StoredAsset, AssetError>;

    async fn delete(&self, asset: &StoredAsset) -> Result<(), AssetError>;
}

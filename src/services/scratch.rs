use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Local holding area for uploaded bytes awaiting remote ingestion.
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    pub async fn create(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Write `data` under `{millis}-{name}`. The returned guard removes the
    /// file when dropped, whatever happens to the request afterwards.
    pub async fn write(&self, original_name: &str, data: &[u8]) -> io::Result<ScratchFile> {
        self.write_at(Utc::now().timestamp_millis(), original_name, data)
            .await
    }

    async fn write_at(
        &self,
        millis: i64,
        original_name: &str,
        data: &[u8],
    ) -> io::Result<ScratchFile> {
        let name = sanitize_file_name(original_name);

        let mut path = self.root.join(scratch_name(millis, &name));
        let mut file = match open_new(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                // Same millisecond, same name: add a random segment.
                path = self.root.join(scratch_name_salted(millis, &name));
                open_new(&path).await?
            }
            Err(e) => return Err(e),
        };

        let scratch = ScratchFile { path };
        file.write_all(data).await?;
        file.flush().await?;

        Ok(scratch)
    }
}

async fn open_new(path: &Path) -> io::Result<tokio::fs::File> {
    tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
}

pub fn scratch_name(millis: i64, name: &str) -> String {
    format!("{millis}-{name}")
}

fn scratch_name_salted(millis: i64, name: &str) -> String {
    let salt = Uuid::now_v7().simple().to_string();
    format!("{millis}-{}-{name}", &salt[salt.len() - 8..])
}

/// Reduce a client-supplied file name to a safe single path component.
pub fn sanitize_file_name(original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// A scratch file owned by one request.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

// Blocking unlink on the dropping thread, usually a runtime worker. The file
// is gone before the response is sent.
impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Scratch file removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove scratch file")
            }
        }
    }
}

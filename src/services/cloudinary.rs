use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::config::CloudinaryConfig;
use crate::services::assets::{AssetError, AssetStore, ResourceKind, StoredAsset};

const DEFAULT_API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Cloudinary upload API client using signed requests.
///
/// Requests are signed with SHA-256, so the account's signature algorithm
/// must be set to SHA-256; accounts left on the SHA-1 default reject every
/// upload with an invalid-signature error.
pub struct CloudinaryStore {
    http: reqwest::Client,
    api_base: String,
    config: CloudinaryConfig,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl CloudinaryStore {
    pub fn new(http: reqwest::Client, config: CloudinaryConfig) -> Self {
        let api_base = config
            .api_base
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/')
            .to_string();
        Self {
            http,
            api_base,
            config,
        }
    }

    fn endpoint(&self, kind: ResourceKind, action: &str) -> String {
        format!("{}/{}/{}/{}", self.api_base, self.config.cloud_name, kind, action)
    }

    /// Common signed fields. `params` must include every signed parameter
    /// except `api_key`, which Cloudinary leaves out of the signature.
    fn signed_form(&self, params: &[(&str, &str)]) -> Form {
        let signature = sign(params, &self.config.api_secret);
        let mut form = Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key.to_string(), value.to_string());
        }
        form
    }
}

#[async_trait]
impl AssetStore for CloudinaryStore {
    async fn upload(
        &self,
        path: &Path,
        content_type: &str,
        kind: ResourceKind,
    ) -> Result<StoredAsset, AssetError> {
        let data = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        let part = Part::bytes(data).file_name(file_name);
        let part = match part.mime_str(content_type) {
            Ok(part) => part,
            Err(_) => {
                return Err(AssetError::Rejected(format!(
                    "invalid content type: {content_type}"
                )));
            }
        };

        let timestamp = Utc::now().timestamp().to_string();
        let form = self
            .signed_form(&[("timestamp", timestamp.as_str())])
            .part("file", part);

        let resp = self
            .http
            .post(self.endpoint(kind, "upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| AssetError::Transport(e.to_string()))?;

        let body: UploadResponse = read_response(resp).await?;
        tracing::debug!(kind = %kind, public_id = %body.public_id, "Cloudinary upload complete");

        Ok(StoredAsset {
            public_id: body.public_id,
            secure_url: body.secure_url,
            kind,
        })
    }

    async fn delete(&self, asset: &StoredAsset) -> Result<(), AssetError> {
        let timestamp = Utc::now().timestamp().to_string();
        let form = self.signed_form(&[
            ("public_id", asset.public_id.as_str()),
            ("timestamp", timestamp.as_str()),
        ]);

        let resp = self
            .http
            .post(self.endpoint(asset.kind, "destroy"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| AssetError::Transport(e.to_string()))?;

        let body: DestroyResponse = read_response(resp).await?;
        if body.result != "ok" {
            return Err(AssetError::Rejected(format!(
                "destroy {} returned {}",
                asset.public_id, body.result
            )));
        }
        Ok(())
    }
}

async fn read_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, AssetError> {
    let status = resp.status();
    if !status.is_success() {
        let message = match resp.json::<ErrorEnvelope>().await {
            Ok(envelope) => envelope.error.message,
            Err(_) => format!("HTTP {status}"),
        };
        return Err(AssetError::Rejected(message));
    }

    resp.json::<T>()
        .await
        .map_err(|e| AssetError::Transport(format!("Invalid response body: {e}")))
}

/// Request signature: SHA-256 hex of the key-sorted `k=v&k=v` string with the
/// API secret appended.
pub fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!("{:x}", Sha256::digest(format!("{joined}{api_secret}").as_bytes()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn store_at(api_base: Option<String>) -> CloudinaryStore {
        CloudinaryStore::new(
            reqwest::Client::new(),
            CloudinaryConfig {
                cloud_name: "demo".into(),
                api_key: "key".into(),
                api_secret: "abcd".into(),
                api_base,
            },
        )
    }

    fn store() -> CloudinaryStore {
        store_at(None)
    }

    fn scratch_video(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let file = dir.path().join("1700000000123-clip.mp4");
        std::fs::write(&file, b"fake mp4 bytes").unwrap();
        file
    }

    fn clip_asset() -> StoredAsset {
        StoredAsset {
            public_id: "clip".into(),
            secure_url: "https://res.cloudinary.com/demo/video/upload/clip.mp4".into(),
            kind: ResourceKind::Video,
        }
    }

    #[test]
    fn test_sign_single_param() {
        assert_eq!(
            sign(&[("timestamp", "1700000000")], "abcd"),
            "29886ed878035abc09e29f7e8ce19b01d9f3caa3ad0851d5d5c2aaa5ab812369"
        );
    }

    #[test]
    fn test_sign_sorts_params() {
        let expected = "a7e1805a336ad1d2754c5479a8da77a691c43b960257ac8912e09cc82e5aa6a3";
        assert_eq!(
            sign(&[("timestamp", "1700000000"), ("public_id", "video/clip")], "abcd"),
            expected
        );
        assert_eq!(
            sign(&[("public_id", "video/clip"), ("timestamp", "1700000000")], "abcd"),
            expected
        );
    }

    #[test]
    fn test_endpoint_per_resource_kind() {
        let store = store();
        assert_eq!(
            store.endpoint(ResourceKind::Image, "upload"),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
        assert_eq!(
            store.endpoint(ResourceKind::Video, "destroy"),
            "https://api.cloudinary.com/v1_1/demo/video/destroy"
        );
    }

    #[tokio::test]
    async fn test_missing_scratch_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = store()
            .upload(&dir.path().join("gone.png"), "image/png", ResourceKind::Image)
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::Io(_)));
    }

    #[tokio::test]
    async fn test_upload_returns_secure_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/demo/video/upload"))
            .and(body_string_contains("name=\"signature_algorithm\""))
            .and(body_string_contains("name=\"api_key\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "public_id": "clip",
                "secure_url": "https://res.cloudinary.com/demo/video/upload/clip.mp4",
                "resource_type": "video",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let asset = store_at(Some(server.uri()))
            .upload(&scratch_video(&dir), "video/mp4", ResourceKind::Video)
            .await
            .unwrap();

        assert_eq!(asset, clip_asset());
    }

    #[tokio::test]
    async fn test_upload_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/demo/video/upload"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "message": "Invalid video file" }
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = store_at(Some(server.uri()))
            .upload(&scratch_video(&dir), "video/mp4", ResourceKind::Video)
            .await
            .unwrap_err();

        assert!(matches!(&err, AssetError::Rejected(msg) if msg == "Invalid video file"));
    }

    #[tokio::test]
    async fn test_upload_error_without_envelope_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = store_at(Some(server.uri()))
            .upload(&scratch_video(&dir), "video/mp4", ResourceKind::Video)
            .await
            .unwrap_err();

        assert!(matches!(&err, AssetError::Rejected(msg) if msg == "HTTP 502 Bad Gateway"));
    }

    #[tokio::test]
    async fn test_delete_ok() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/demo/video/destroy"))
            .and(body_string_contains("name=\"public_id\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "ok" })))
            .expect(1)
            .mount(&server)
            .await;

        store_at(Some(server.uri()))
            .delete(&clip_asset())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_not_found_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/demo/video/destroy"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "result": "not found" })),
            )
            .mount(&server)
            .await;

        let err = store_at(Some(server.uri()))
            .delete(&clip_asset())
            .await
            .unwrap_err();

        assert!(
            matches!(&err, AssetError::Rejected(msg) if msg == "destroy clip returned not found")
        );
    }

    #[test]
    fn test_api_base_override_trims_slash() {
        let store = store_at(Some("http://127.0.0.1:9999/".into()));
        assert_eq!(
            store.endpoint(ResourceKind::Image, "upload"),
            "http://127.0.0.1:9999/demo/image/upload"
        );
    }
}

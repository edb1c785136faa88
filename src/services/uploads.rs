use axum::body::Bytes;
use axum::extract::multipart::{Field, MultipartError};
use axum::http::StatusCode;

use crate::error::ApiError;

/// One file field received from the client.
#[derive(Debug)]
pub struct IncomingFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Parsed body of an upload request.
#[derive(Debug)]
pub struct UploadForm {
    pub title: String,
    pub description: String,
    pub thumbnail: IncomingFile,
    pub video: IncomingFile,
}

/// Extract the `thumbnail`/`video` files and `title`/`description` text from
/// a multipart upload. Unknown fields are skipped; a repeated file field keeps
/// its first occurrence.
pub async fn extract_upload_form(
    mut multipart: axum::extract::Multipart,
) -> Result<UploadForm, ApiError> {
    let mut thumbnail: Option<IncomingFile> = None;
    let mut video: Option<IncomingFile> = None;
    let mut title: Option<String> = None;
    let mut description: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| form_error(e, "form"))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "thumbnail" if thumbnail.is_none() => {
                thumbnail = Some(read_file(field, "thumbnail").await?);
            }
            "video" if video.is_none() => {
                video = Some(read_file(field, "video").await?);
            }
            "title" => {
                let text = field.text().await.map_err(|e| form_error(e, "title"))?;
                title = Some(text);
            }
            "description" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| form_error(e, "description"))?;
                description = Some(text);
            }
            _ => {}
        }
    }

    let thumbnail = thumbnail.ok_or(ApiError::InvalidInput("Missing thumbnail file".into()))?;
    let video = video.ok_or(ApiError::InvalidInput("Missing video file".into()))?;

    Ok(UploadForm {
        title: title.unwrap_or_default(),
        description: description.unwrap_or_default(),
        thumbnail,
        video,
    })
}

async fn read_file(field: Field<'_>, label: &str) -> Result<IncomingFile, ApiError> {
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    let data = field.bytes().await.map_err(|e| form_error(e, label))?;

    if data.is_empty() {
        return Err(ApiError::InvalidInput(format!("Empty {label} file")));
    }

    Ok(IncomingFile {
        file_name,
        content_type,
        data,
    })
}

/// The body limit surfaces as a multipart read error; keep its 413 apart from
/// malformed input.
fn form_error(e: MultipartError, label: &str) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::InvalidInput(format!("Failed to read {label}: {}", e.body_text()))
    }
}

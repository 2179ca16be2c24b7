//! Upload and media listing endpoints

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use songduel_common::db::Song;

use super::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::upload::{MediaFile, NewUpload};
use crate::AppState;

/// Multipart field carrying the audio file
pub const FILE_FIELD: &str = "soundFile";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub song: Song,
}

#[derive(Debug, Serialize)]
pub struct FilesResponse {
    pub files: Vec<MediaFile>,
}

/// POST /upload
///
/// Multipart form with `soundFile` and optional `title` / `artist` text
/// fields. Unknown fields are ignored.
pub async fn upload_song(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let mut upload = NewUpload::default();
    let mut saw_file = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed upload: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FILE_FIELD => {
                upload.original_name = field.file_name().unwrap_or_default().to_string();
                upload.data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?
                    .to_vec();
                saw_file = true;
            }
            "title" | "artist" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read {}: {}", name, e)))?;
                if name == "title" {
                    upload.title = Some(text);
                } else {
                    upload.artist = Some(text);
                }
            }
            _ => {}
        }
    }

    if !saw_file {
        return Err(ApiError::BadRequest("No file uploaded.".to_string()));
    }

    let song = state.uploads.store_song(&user.guid, upload).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "File and data uploaded successfully!".to_string(),
            song,
        }),
    ))
}

/// GET /files
pub async fn list_files(State(state): State<AppState>) -> ApiResult<Json<FilesResponse>> {
    let files = state.uploads.list_files().await?;
    Ok(Json(FilesResponse { files }))
}

//! Song listing endpoints

use axum::{extract::State, Json};
use serde::Serialize;
use songduel_common::db::Song;

use super::CurrentUser;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SongListResponse {
    pub message: String,
    pub songs: Vec<Song>,
}

/// GET /songs
///
/// All songs, newest first.
pub async fn list_songs(State(state): State<AppState>) -> ApiResult<Json<SongListResponse>> {
    let songs = state.songs.get_all().await?;
    Ok(Json(SongListResponse {
        message: format!("{} songs", songs.len()),
        songs,
    }))
}

/// GET /songs/mine
///
/// Songs uploaded by the caller, newest first.
pub async fn my_songs(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<SongListResponse>> {
    let songs = state.songs.get_by_owner(&user.guid).await?;
    Ok(Json(SongListResponse {
        message: format!("{} songs uploaded by {}", songs.len(), user.username),
        songs,
    }))
}

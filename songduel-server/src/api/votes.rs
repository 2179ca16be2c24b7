//! Voting endpoints: single like/dislike, comparison pairs and paired votes

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use songduel_common::db::Song;

use crate::error::{ApiError, ApiResult};
use crate::ledger::VoteSide;
use crate::selector::PairSelection;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub message: String,
    pub song: Song,
}

/// Body of POST /songs/compare-vote
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareVoteRequest {
    pub chosen_song_id: Option<String>,
    pub unchosen_song_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareVoteResponse {
    pub message: String,
    pub chosen_song: Option<Song>,
    pub unchosen_song: Option<Song>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<VoteSide>,
}

#[derive(Debug, Serialize)]
pub struct RandomPairResponse {
    pub message: String,
    pub songs: Vec<Song>,
}

/// POST /songs/:id/like
pub async fn like_song(
    State(state): State<AppState>,
    Path(song_id): Path<String>,
) -> ApiResult<Json<VoteResponse>> {
    let song = state.ledger.increment_like(&song_id).await?;
    Ok(Json(VoteResponse {
        message: "Liked successfully!".to_string(),
        song,
    }))
}

/// POST /songs/:id/dislike
pub async fn dislike_song(
    State(state): State<AppState>,
    Path(song_id): Path<String>,
) -> ApiResult<Json<VoteResponse>> {
    let song = state.ledger.increment_dislike(&song_id).await?;
    Ok(Json(VoteResponse {
        message: "Disliked successfully!".to_string(),
        song,
    }))
}

/// POST /songs/compare-vote
///
/// 400 when either id is missing, 404 when neither resolves. When only one
/// resolves the vote is applied to that side and `missing` names the other.
pub async fn compare_vote(
    State(state): State<AppState>,
    body: Result<Json<CompareVoteRequest>, JsonRejection>,
) -> ApiResult<Json<CompareVoteResponse>> {
    let Json(request) = body?;

    let (chosen, unchosen) = match (request.chosen_song_id, request.unchosen_song_id) {
        (Some(chosen), Some(unchosen)) if !chosen.trim().is_empty() && !unchosen.trim().is_empty() => {
            (chosen, unchosen)
        }
        _ => {
            return Err(ApiError::BadRequest(
                "Both chosenSongId and unchosenSongId are required.".to_string(),
            ))
        }
    };

    let vote = state.ledger.record_paired_vote(&chosen, &unchosen).await?;
    let missing = vote.missing_side();
    let message = match missing {
        None => "Comparison vote recorded successfully!".to_string(),
        Some(VoteSide::Chosen) => {
            "Comparison vote partially recorded: chosen song not found.".to_string()
        }
        Some(VoteSide::Unchosen) => {
            "Comparison vote partially recorded: unchosen song not found.".to_string()
        }
    };

    Ok(Json(CompareVoteResponse {
        message,
        chosen_song: vote.winner,
        unchosen_song: vote.loser,
        missing,
    }))
}

/// GET /songs/random
///
/// Fewer than two songs is a normal, empty result rather than an error.
pub async fn random_pair(State(state): State<AppState>) -> ApiResult<Json<RandomPairResponse>> {
    let response = match state.selector.pick_pair().await? {
        PairSelection::Pair(first, second) => RandomPairResponse {
            message: "Two random songs retrieved for comparison!".to_string(),
            songs: vec![first, second],
        },
        PairSelection::InsufficientData { available } => RandomPairResponse {
            message: format!(
                "Need at least 2 songs for comparison. Only {} available.",
                available
            ),
            songs: Vec::new(),
        },
    };

    Ok(Json(response))
}

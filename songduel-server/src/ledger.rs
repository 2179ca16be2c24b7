//! Vote ledger
//!
//! Owns every mutation of a song's like/dislike counters. Each increment is
//! a read of the current song followed by a conditional update against the
//! version that was read; a lost race is retried, never overwritten, so two
//! concurrent +1s always land as +2. Votes on the same song from this
//! process are queued per song first, so conflicts only come from other
//! writers of the same store.

use serde::Serialize;
use songduel_common::db::{Song, VoteCounts, VoteKind};
use songduel_common::{Error, Result};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::store::{SongStore, UpdateOutcome};
use crate::utils::{retry_transient, SongLocks};

/// Side of a paired vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteSide {
    Chosen,
    Unchosen,
}

/// Outcome of [`VoteLedger::record_paired_vote`]
///
/// At least one side is present; a `None` side did not resolve to a song
/// and was left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairedVote {
    pub winner: Option<Song>,
    pub loser: Option<Song>,
}

impl PairedVote {
    /// The side that could not be applied, if any
    pub fn missing_side(&self) -> Option<VoteSide> {
        match (&self.winner, &self.loser) {
            (Some(_), None) => Some(VoteSide::Unchosen),
            (None, Some(_)) => Some(VoteSide::Chosen),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.winner.is_some() && self.loser.is_some()
    }
}

pub struct VoteLedger {
    store: Arc<dyn SongStore>,
    max_attempts: u32,
    locks: SongLocks,
}

/// One counter change applied under the version check
#[derive(Debug, Clone, Copy)]
enum Adjustment {
    Cast(VoteKind),
    Withdraw(VoteKind),
}

impl Adjustment {
    fn as_str(&self) -> &'static str {
        match self {
            Adjustment::Cast(kind) => kind.as_str(),
            Adjustment::Withdraw(VoteKind::Like) => "withdraw like",
            Adjustment::Withdraw(VoteKind::Dislike) => "withdraw dislike",
        }
    }

    fn apply(&self, counts: VoteCounts) -> Result<VoteCounts> {
        match *self {
            Adjustment::Cast(kind) => counts.incremented(kind),
            Adjustment::Withdraw(kind) => counts.decremented(kind),
        }
    }
}

impl VoteLedger {
    /// `max_attempts` bounds the conditional-update attempts per song
    pub fn new(store: Arc<dyn SongStore>, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts: max_attempts.max(1),
            locks: SongLocks::new(),
        }
    }

    pub async fn increment_like(&self, song_id: &str) -> Result<Song> {
        require_id(song_id, "Song ID")?;
        let _guard = self.locks.acquire(song_id).await;
        let song = self.apply(song_id, Adjustment::Cast(VoteKind::Like)).await?;
        info!(song_id, likes = song.likes, "Song liked");
        Ok(song)
    }

    pub async fn increment_dislike(&self, song_id: &str) -> Result<Song> {
        require_id(song_id, "Song ID")?;
        let _guard = self.locks.acquire(song_id).await;
        let song = self.apply(song_id, Adjustment::Cast(VoteKind::Dislike)).await?;
        info!(song_id, dislikes = song.dislikes, "Song disliked");
        Ok(song)
    }

    /// Credit `winner_id` with a like and `loser_id` with a dislike.
    ///
    /// Both ids are resolved before anything is written, so when neither
    /// exists the store is left unchanged and `NotFound` is returned. When
    /// only one exists, that side is still applied and the other is
    /// reported missing. If the loser's write fails after the winner's
    /// landed, the winner's like is withdrawn before the error is returned.
    pub async fn record_paired_vote(&self, winner_id: &str, loser_id: &str) -> Result<PairedVote> {
        require_id(winner_id, "chosenSongId")?;
        require_id(loser_id, "unchosenSongId")?;
        if winner_id == loser_id {
            return Err(Error::InvalidInput(
                "chosenSongId and unchosenSongId must differ".to_string(),
            ));
        }

        let _guards = self.locks.acquire_pair(winner_id, loser_id).await;

        let winner_exists = self.exists(winner_id).await?;
        let loser_exists = self.exists(loser_id).await?;
        if !winner_exists && !loser_exists {
            return Err(Error::NotFound(format!(
                "Neither song found: {}, {}",
                winner_id, loser_id
            )));
        }

        let winner = if winner_exists {
            self.apply_if_present(winner_id, VoteKind::Like).await?
        } else {
            None
        };
        let loser = if loser_exists {
            match self.apply_if_present(loser_id, VoteKind::Dislike).await {
                Ok(loser) => loser,
                Err(e) => {
                    if winner.is_some() {
                        self.withdraw_like(winner_id, &e).await;
                    }
                    return Err(e);
                }
            }
        } else {
            None
        };

        let vote = PairedVote { winner, loser };
        match vote.missing_side() {
            None if vote.is_complete() => {
                info!(winner_id, loser_id, "Comparison vote recorded");
            }
            Some(side) => {
                warn!(winner_id, loser_id, missing = ?side, "Comparison vote partially recorded");
            }
            None => {
                // Both songs disappeared between resolution and write
                return Err(Error::NotFound(format!(
                    "Neither song found: {}, {}",
                    winner_id, loser_id
                )));
            }
        }

        Ok(vote)
    }

    /// Roll back the winner's like of a paired vote whose loser failed
    async fn withdraw_like(&self, winner_id: &str, cause: &Error) {
        match self
            .apply(winner_id, Adjustment::Withdraw(VoteKind::Like))
            .await
        {
            Ok(_) => {
                warn!(winner_id, error = %cause, "Paired vote failed; winner's like withdrawn");
            }
            Err(e) => {
                error!(
                    winner_id,
                    error = %e,
                    cause = %cause,
                    "Paired vote failed and the winner's like could not be withdrawn"
                );
            }
        }
    }

    async fn exists(&self, song_id: &str) -> Result<bool> {
        let store = &self.store;
        retry_transient("song lookup", self.max_attempts, || async move {
            Ok(store.get_by_id(song_id).await?.is_some())
        })
        .await
    }

    async fn apply_if_present(&self, song_id: &str, kind: VoteKind) -> Result<Option<Song>> {
        match self.apply(song_id, Adjustment::Cast(kind)).await {
            Ok(song) => Ok(Some(song)),
            Err(Error::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Read-modify-write one counter under the store's version check.
    /// Callers hold the song's lock.
    async fn apply(&self, song_id: &str, adjustment: Adjustment) -> Result<Song> {
        let store = &self.store;
        retry_transient(adjustment.as_str(), self.max_attempts, || async move {
            let current = store
                .get_by_id(song_id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("Song not found: {}", song_id)))?;

            let counts = adjustment.apply(current.counts())?;
            match store
                .conditional_update(song_id, current.version, counts)
                .await?
            {
                UpdateOutcome::Applied(song) => Ok(song),
                UpdateOutcome::Conflict => {
                    debug!(song_id, version = current.version, "Conditional update lost a race");
                    Err(Error::Conflict(format!(
                        "Song {} changed since version {}",
                        song_id, current.version
                    )))
                }
            }
        })
        .await
    }
}

/// Reject blank ids; non-blank ids are looked up exactly as given
fn require_id(id: &str, field: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} is required", field)));
    }
    Ok(())
}

//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{time, uuid_utils, Error, Result};

/// An uploaded song and its vote tally
///
/// Serialized with the column names the browser client reads
/// (`user_id`, `url`). `version` is the optimistic-concurrency token and
/// never leaves the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    #[serde(rename = "user_id")]
    pub owner: String,
    pub title: String,
    pub artist: String,
    pub filename: String,
    #[serde(rename = "url")]
    pub media_url: String,
    pub likes: i64,
    pub dislikes: i64,
    #[serde(default, skip_serializing)]
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl Song {
    /// Create a fresh, unvoted song owned by `owner`
    pub fn new(
        owner: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        filename: impl Into<String>,
        media_url: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid_utils::generate_id(),
            owner: owner.into(),
            title: title.into(),
            artist: artist.into(),
            filename: filename.into(),
            media_url: media_url.into(),
            likes: 0,
            dislikes: 0,
            version: 0,
            created_at: time::now(),
        }
    }

    pub fn counts(&self) -> VoteCounts {
        VoteCounts {
            likes: self.likes,
            dislikes: self.dislikes,
        }
    }
}

/// The only mutable part of a song
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoteCounts {
    pub likes: i64,
    pub dislikes: i64,
}

/// Which counter a vote increments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteKind {
    Like,
    Dislike,
}

impl VoteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteKind::Like => "like",
            VoteKind::Dislike => "dislike",
        }
    }
}

impl VoteCounts {
    /// Counts after one more vote of `kind`
    ///
    /// A counter already at `i64::MAX` rejects the vote rather than
    /// recording it as a no-op.
    pub fn incremented(self, kind: VoteKind) -> Result<Self> {
        let overflow = || Error::InvalidInput(format!("{} count is at its maximum", kind.as_str()));
        match kind {
            VoteKind::Like => Ok(Self {
                likes: self.likes.checked_add(1).ok_or_else(overflow)?,
                ..self
            }),
            VoteKind::Dislike => Ok(Self {
                dislikes: self.dislikes.checked_add(1).ok_or_else(overflow)?,
                ..self
            }),
        }
    }

    /// Counts with one vote of `kind` withdrawn; never goes below zero
    pub fn decremented(self, kind: VoteKind) -> Result<Self> {
        let underflow = || Error::Internal(format!("no {} to withdraw", kind.as_str()));
        let lower = |count: i64| (count > 0).then(|| count - 1).ok_or_else(underflow);
        match kind {
            VoteKind::Like => Ok(Self {
                likes: lower(self.likes)?,
                ..self
            }),
            VoteKind::Dislike => Ok(Self {
                dislikes: lower(self.dislikes)?,
                ..self
            }),
        }
    }
}

/// A user able to upload songs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub guid: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub token: String,
    pub created_at: DateTime<Utc>,
}

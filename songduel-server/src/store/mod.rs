//! Song storage collaborator
//!
//! The vote ledger and the comparison selector only ever talk to songs
//! through [`SongStore`]. Counter writes go through
//! [`SongStore::conditional_update`], which succeeds only when the stored
//! `version` still matches what the caller read; that check is what makes
//! per-song increments linearizable.

use async_trait::async_trait;
use songduel_common::db::{Song, VoteCounts};
use songduel_common::Result;

pub mod memory;
pub mod sqlite;

pub use memory::MemorySongStore;
pub use sqlite::SqliteSongStore;

/// Result of a conditional write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Write applied; the song as stored afterwards
    Applied(Song),
    /// Stored version differed from the expected one (or the song vanished)
    Conflict,
}

#[async_trait]
pub trait SongStore: Send + Sync {
    async fn get_by_id(&self, id: &str) -> Result<Option<Song>>;

    /// All songs, newest first
    async fn get_all(&self) -> Result<Vec<Song>>;

    /// Songs uploaded by `owner`, newest first
    async fn get_by_owner(&self, owner: &str) -> Result<Vec<Song>>;

    /// Replace the vote counts of `id` if its version is still
    /// `expected_version`, bumping the version on success
    async fn conditional_update(
        &self,
        id: &str,
        expected_version: i64,
        counts: VoteCounts,
    ) -> Result<UpdateOutcome>;

    /// Persist a new song; fails if the id is already taken
    async fn insert(&self, song: &Song) -> Result<()>;
}

//! In-memory song store
//!
//! Used for `storage = "memory"` and as the store behind most tests. The
//! version check and the write happen under one write-lock acquisition, the
//! same guarantee the SQLite store gets from a single conditional UPDATE.

use async_trait::async_trait;
use songduel_common::db::{Song, VoteCounts};
use songduel_common::{Error, Result};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{SongStore, UpdateOutcome};

#[derive(Default)]
pub struct MemorySongStore {
    songs: RwLock<HashMap<String, Song>>,
}

impl MemorySongStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `songs`
    pub fn with_songs(songs: impl IntoIterator<Item = Song>) -> Self {
        let songs = songs.into_iter().map(|s| (s.id.clone(), s)).collect();
        Self {
            songs: RwLock::new(songs),
        }
    }
}

fn newest_first(mut songs: Vec<Song>) -> Vec<Song> {
    songs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    songs
}

#[async_trait]
impl SongStore for MemorySongStore {
    async fn get_by_id(&self, id: &str) -> Result<Option<Song>> {
        Ok(self.songs.read().await.get(id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Song>> {
        let songs = self.songs.read().await.values().cloned().collect();
        Ok(newest_first(songs))
    }

    async fn get_by_owner(&self, owner: &str) -> Result<Vec<Song>> {
        let songs = self
            .songs
            .read()
            .await
            .values()
            .filter(|s| s.owner == owner)
            .cloned()
            .collect();
        Ok(newest_first(songs))
    }

    async fn conditional_update(
        &self,
        id: &str,
        expected_version: i64,
        counts: VoteCounts,
    ) -> Result<UpdateOutcome> {
        let mut songs = self.songs.write().await;
        match songs.get_mut(id) {
            Some(song) if song.version == expected_version => {
                song.likes = counts.likes;
                song.dislikes = counts.dislikes;
                song.version += 1;
                Ok(UpdateOutcome::Applied(song.clone()))
            }
            _ => Ok(UpdateOutcome::Conflict),
        }
    }

    async fn insert(&self, song: &Song) -> Result<()> {
        let mut songs = self.songs.write().await;
        if songs.contains_key(&song.id) {
            return Err(Error::InvalidInput(format!(
                "Song id already exists: {}",
                song.id
            )));
        }
        songs.insert(song.id.clone(), song.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_conditional_update_bumps_version_once() {
        let song = Song::new("o", "t", "a", "f.mp3", "/uploads/f.mp3");
        let id = song.id.clone();
        let store = MemorySongStore::with_songs([song]);

        let counts = VoteCounts { likes: 0, dislikes: 1 };
        assert!(matches!(
            store.conditional_update(&id, 0, counts).await.unwrap(),
            UpdateOutcome::Applied(_)
        ));
        assert_eq!(
            store.conditional_update(&id, 0, counts).await.unwrap(),
            UpdateOutcome::Conflict
        );

        let stored = store.get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.dislikes, 1);
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn test_insert_rejects_reused_id() {
        let song = Song::new("o", "t", "a", "f.mp3", "/uploads/f.mp3");
        let store = MemorySongStore::new();
        store.insert(&song).await.unwrap();
        assert!(store.insert(&song).await.is_err());
        assert_eq!(store.get_all().await.unwrap().len(), 1);
    }
}

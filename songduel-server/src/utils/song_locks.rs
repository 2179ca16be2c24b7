//! Per-song write serialization
//!
//! Votes on the same song from this process queue behind one async lock,
//! so the conditional update only ever races writers in other processes.
//! Entries are dropped as soon as nobody holds or waits for them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Default)]
pub struct SongLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Held while a song's counters are being changed
pub struct SongLockGuard<'a> {
    owner: &'a SongLocks,
    song_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl SongLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `song_id`
    pub async fn acquire(&self, song_id: &str) -> SongLockGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(song_id.to_string()).or_default().clone()
        };

        SongLockGuard {
            owner: self,
            song_id: song_id.to_string(),
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Lock two distinct songs, always in id order so paired votes with
    /// swapped sides cannot deadlock
    pub async fn acquire_pair(&self, a: &str, b: &str) -> (SongLockGuard<'_>, SongLockGuard<'_>) {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        let first = self.acquire(first).await;
        let second = self.acquire(second).await;
        (first, second)
    }

    /// Number of songs currently locked or awaited
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for SongLockGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();

        let mut locks = self
            .owner
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(lock) = locks.get(&self.song_id) {
            // Only the map still references it
            if Arc::strong_count(lock) == 1 {
                locks.remove(&self.song_id);
            }
        }
    }
}

//! Comparison selector
//!
//! Picks two distinct songs for a head-to-head vote. The eligible set is
//! every persisted song; the size check happens before sampling so a store
//! with zero or one song returns immediately.

use rand::rngs::StdRng;
use rand::SeedableRng;
use songduel_common::db::Song;
use songduel_common::Result;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

use crate::store::SongStore;

/// Result of [`ComparisonSelector::pick_pair`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairSelection {
    Pair(Song, Song),
    /// Fewer than two songs exist; `available` is how many do
    InsufficientData { available: usize },
}

pub struct ComparisonSelector {
    store: Arc<dyn SongStore>,
    rng: Mutex<StdRng>,
}

impl ComparisonSelector {
    pub fn new(store: Arc<dyn SongStore>) -> Self {
        Self {
            store,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic selector for reproducible tests
    pub fn with_seed(store: Arc<dyn SongStore>, seed: u64) -> Self {
        Self {
            store,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Sample two songs uniformly at random without replacement
    pub async fn pick_pair(&self) -> Result<PairSelection> {
        let mut songs = self.store.get_all().await?;
        if songs.len() < 2 {
            debug!(available = songs.len(), "Not enough songs for a comparison");
            return Ok(PairSelection::InsufficientData {
                available: songs.len(),
            });
        }

        let (first, second) = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            let picked = rand::seq::index::sample(&mut *rng, songs.len(), 2);
            (picked.index(0), picked.index(1))
        };

        // Remove the higher index first so the lower one stays valid
        let (high, low) = if first > second {
            (first, second)
        } else {
            (second, first)
        };
        let high_song = songs.swap_remove(high);
        let low_song = songs.swap_remove(low);

        let pair = if first > second {
            (high_song, low_song)
        } else {
            (low_song, high_song)
        };
        debug!(first = %pair.0.id, second = %pair.1.id, "Picked comparison pair");

        Ok(PairSelection::Pair(pair.0, pair.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySongStore;
    use std::collections::HashMap;

    fn songs(n: usize) -> Vec<Song> {
        (0..n)
            .map(|i| {
                let mut song = Song::new("owner", format!("song {}", i), "Artist", "f.mp3", "/uploads/f.mp3");
                song.id = format!("s{}", i);
                song
            })
            .collect()
    }

    #[tokio::test]
    async fn test_empty_store_is_insufficient() {
        let selector = ComparisonSelector::new(Arc::new(MemorySongStore::new()));
        assert_eq!(
            selector.pick_pair().await.unwrap(),
            PairSelection::InsufficientData { available: 0 }
        );
    }

    #[tokio::test]
    async fn test_single_song_is_insufficient() {
        let selector = ComparisonSelector::new(Arc::new(MemorySongStore::with_songs(songs(1))));
        assert_eq!(
            selector.pick_pair().await.unwrap(),
            PairSelection::InsufficientData { available: 1 }
        );
    }

    #[tokio::test]
    async fn test_two_songs_always_both_returned() {
        let selector =
            ComparisonSelector::with_seed(Arc::new(MemorySongStore::with_songs(songs(2))), 7);

        for _ in 0..50 {
            match selector.pick_pair().await.unwrap() {
                PairSelection::Pair(a, b) => {
                    assert_ne!(a.id, b.id);
                    let mut ids = vec![a.id, b.id];
                    ids.sort();
                    assert_eq!(ids, vec!["s0", "s1"]);
                }
                other => panic!("expected a pair, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_every_song_gets_picked_eventually() {
        let selector =
            ComparisonSelector::with_seed(Arc::new(MemorySongStore::with_songs(songs(6))), 42);
        let mut seen: HashMap<String, usize> = HashMap::new();

        for _ in 0..600 {
            if let PairSelection::Pair(a, b) = selector.pick_pair().await.unwrap() {
                assert_ne!(a.id, b.id);
                *seen.entry(a.id).or_default() += 1;
                *seen.entry(b.id).or_default() += 1;
            }
        }

        assert_eq!(seen.len(), 6, "every song should appear: {:?}", seen);
        // 1200 slots over 6 songs: expect ~200 each
        assert!(seen.values().all(|&n| n > 100), "skewed selection: {:?}", seen);
    }

    #[tokio::test]
    async fn test_both_positions_are_used() {
        let selector =
            ComparisonSelector::with_seed(Arc::new(MemorySongStore::with_songs(songs(2))), 3);
        let mut first_ids = std::collections::HashSet::new();

        for _ in 0..100 {
            if let PairSelection::Pair(a, _) = selector.pick_pair().await.unwrap() {
                first_ids.insert(a.id);
            }
        }

        assert_eq!(first_ids.len(), 2);
    }
}

//! Utility modules

pub mod retry;
pub mod song_locks;

pub use retry::retry_transient;
pub use song_locks::{SongLockGuard, SongLocks};

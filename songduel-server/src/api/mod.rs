//! HTTP API handlers

pub mod health;
pub mod identity;
pub mod songs;
pub mod upload;
pub mod votes;

pub use health::health_routes;
pub use identity::CurrentUser;
pub use songs::{list_songs, my_songs};
pub use upload::{list_files, upload_song};
pub use votes::{compare_vote, dislike_song, like_song, random_pair};

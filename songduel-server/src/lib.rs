//! songduel-server library
//!
//! Song upload and pairwise voting service. The vote ledger and the
//! comparison selector are built around an injected [`store::SongStore`];
//! the HTTP layer in [`api`] is thin glue over them.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod ledger;
pub mod selector;
pub mod store;
pub mod upload;
pub mod utils;

use ledger::VoteLedger;
use selector::ComparisonSelector;
use store::SongStore;
use upload::{UploadService, MEDIA_URL_PREFIX};

/// Tunables taken from the TOML config
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub vote_max_attempts: u32,
    pub max_upload_bytes: usize,
    pub uploads_dir: PathBuf,
}

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// User database, used to resolve identity tokens
    pub db: SqlitePool,
    pub songs: Arc<dyn SongStore>,
    pub ledger: Arc<VoteLedger>,
    pub selector: Arc<ComparisonSelector>,
    pub uploads: Arc<UploadService>,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Wire the ledger, selector and upload service to one song store
    pub fn new(db: SqlitePool, songs: Arc<dyn SongStore>, settings: ServerSettings) -> Self {
        Self::with_selector(
            db,
            songs.clone(),
            ComparisonSelector::new(songs),
            settings,
        )
    }

    /// Same as [`AppState::new`] with a caller-built selector (e.g. seeded)
    pub fn with_selector(
        db: SqlitePool,
        songs: Arc<dyn SongStore>,
        selector: ComparisonSelector,
        settings: ServerSettings,
    ) -> Self {
        Self {
            db,
            ledger: Arc::new(VoteLedger::new(songs.clone(), settings.vote_max_attempts)),
            selector: Arc::new(selector),
            uploads: Arc::new(UploadService::new(songs.clone(), settings.uploads_dir)),
            songs,
            max_upload_bytes: settings.max_upload_bytes,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let media = ServeDir::new(state.uploads.uploads_dir());
    let max_upload_bytes = state.max_upload_bytes;

    let upload_routes = Router::new()
        .route("/upload", post(api::upload_song))
        .layer(DefaultBodyLimit::max(max_upload_bytes));

    Router::new()
        .route("/songs", get(api::list_songs))
        .route("/songs/mine", get(api::my_songs))
        .route("/songs/random", get(api::random_pair))
        .route("/songs/compare-vote", post(api::compare_vote))
        .route("/songs/:id/like", post(api::like_song))
        .route("/songs/:id/dislike", post(api::dislike_song))
        .route("/files", get(api::list_files))
        .merge(upload_routes)
        .merge(api::health_routes())
        .nest_service(MEDIA_URL_PREFIX, media)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

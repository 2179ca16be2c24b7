//! songduel-server - song upload and pairwise voting service
//!
//! Startup order: config, tracing, build identification, root folder,
//! database, song store, router.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use songduel_common::config::{
    self, ConfigSource, RootFolderInitializer, RootFolderResolver, StorageBackend,
};
use songduel_common::db::{init_database, users};
use songduel_server::store::{MemorySongStore, SongStore, SqliteSongStore};
use songduel_server::{build_router, AppState, ServerSettings};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "songduel-server", version, about = "Song upload and pairwise voting service")]
struct CliArgs {
    /// Root folder holding the database and uploads (overrides SONGDUEL_ROOT)
    #[arg(long)]
    root_folder: Option<PathBuf>,

    /// Config file (default: <config dir>/songduel/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service (default)
    Serve,
    /// Create a user and print its identity token
    AddUser { username: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    let loaded = config::load_or_default(args.config.as_deref());
    let toml_config = loaded.config;

    // RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&toml_config.logging.level)),
        )
        .init();

    info!(
        "Starting songduel-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match &loaded.source {
        ConfigSource::File(path) => info!("Loaded config from {}", path.display()),
        ConfigSource::Defaults { reason } => warn!("Using default config: {}", reason),
    }

    let resolver = RootFolderResolver::new(args.root_folder.clone(), toml_config.root_folder.clone());
    let initializer = RootFolderInitializer::new(resolver.resolve());
    initializer
        .ensure_directory_exists()
        .with_context(|| format!("Failed to initialize root folder {}", initializer.root().display()))?;
    info!("Root folder: {}", initializer.root().display());

    let db_path = initializer.database_path();
    let pool = match init_database(&db_path).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to open database {}: {}", db_path.display(), e);
            return Err(e.into());
        }
    };

    if let Some(Command::AddUser { username }) = &args.command {
        let user = users::create_user(&pool, username).await?;
        info!(guid = %user.guid, "Created user {}", user.username);
        println!("{}", user.token);
        return Ok(());
    }

    let songs: Arc<dyn SongStore> = match toml_config.storage {
        StorageBackend::Sqlite => Arc::new(SqliteSongStore::new(pool.clone())),
        StorageBackend::Memory => {
            warn!("Using in-memory song store; songs are lost on exit");
            Arc::new(MemorySongStore::new())
        }
    };

    let settings = ServerSettings {
        vote_max_attempts: toml_config.vote_max_attempts,
        max_upload_bytes: toml_config.max_upload_bytes,
        uploads_dir: initializer.uploads_path(),
    };
    let state = AppState::new(pool, songs, settings);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&toml_config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", toml_config.bind_addr))?;
    info!("songduel-server listening on http://{}", toml_config.bind_addr);
    info!("Health check: http://{}/health", toml_config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

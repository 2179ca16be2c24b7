//! Upload collaborator
//!
//! Stores audio blobs under the uploads directory and records the song
//! that points at them. A song row is written only after its blob is on
//! disk, and the blob is removed again if the row cannot be written, so no
//! song is ever selectable without its media.

use serde::Serialize;
use songduel_common::db::Song;
use songduel_common::{uuid_utils, Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::store::SongStore;

/// Audio file extensions accepted for upload and listed by `/files`
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "m4a", "flac"];

/// URL prefix under which stored blobs are served
pub const MEDIA_URL_PREFIX: &str = "/uploads";

const DEFAULT_TITLE: &str = "Untitled Song";
const DEFAULT_ARTIST: &str = "Unknown Artist";

/// A file received from the client, before it is stored
#[derive(Debug, Clone, Default)]
pub struct NewUpload {
    pub original_name: String,
    pub data: Vec<u8>,
    pub title: Option<String>,
    pub artist: Option<String>,
}

/// Entry of the `/files` listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaFile {
    pub name: String,
    pub url: String,
}

/// Lower-cased audio extension of `name`, if it is an accepted one
pub fn audio_extension(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    AUDIO_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

fn non_blank_or(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub struct UploadService {
    store: Arc<dyn SongStore>,
    uploads_dir: PathBuf,
}

impl UploadService {
    pub fn new(store: Arc<dyn SongStore>, uploads_dir: PathBuf) -> Self {
        Self { store, uploads_dir }
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    /// Store the blob and create an unvoted song owned by `owner`
    pub async fn store_song(&self, owner: &str, upload: NewUpload) -> Result<Song> {
        if upload.data.is_empty() {
            return Err(Error::InvalidInput("No file uploaded.".to_string()));
        }
        let ext = audio_extension(&upload.original_name).ok_or_else(|| {
            Error::InvalidInput(format!(
                "Unsupported file type: {} (expected one of {})",
                upload.original_name,
                AUDIO_EXTENSIONS.join(", ")
            ))
        })?;

        tokio::fs::create_dir_all(&self.uploads_dir).await?;

        let filename = format!("{}.{}", uuid_utils::generate_id(), ext);
        let blob_path = self.uploads_dir.join(&filename);
        tokio::fs::write(&blob_path, &upload.data).await?;

        let song = Song::new(
            owner,
            non_blank_or(upload.title, DEFAULT_TITLE),
            non_blank_or(upload.artist, DEFAULT_ARTIST),
            filename.clone(),
            format!("{}/{}", MEDIA_URL_PREFIX, filename),
        );

        if let Err(e) = self.store.insert(&song).await {
            error!(song_id = %song.id, error = %e, "Failed to save song metadata");
            if let Err(unlink_err) = tokio::fs::remove_file(&blob_path).await {
                warn!(path = %blob_path.display(), error = %unlink_err, "Failed to remove orphaned upload");
            }
            return Err(e);
        }

        info!(
            song_id = %song.id,
            owner,
            bytes = upload.data.len(),
            "Song uploaded"
        );
        Ok(song)
    }

    /// Audio files present in the uploads directory, sorted by name
    pub async fn list_files(&self) -> Result<Vec<MediaFile>> {
        let mut entries = match tokio::fs::read_dir(&self.uploads_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "Uploads directory not found at: {}. Returning empty list.",
                    self.uploads_dir.display()
                );
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if audio_extension(&name).is_some() {
                files.push(MediaFile {
                    url: format!("{}/{}", MEDIA_URL_PREFIX, name),
                    name,
                });
            }
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySongStore;
    use tempfile::TempDir;

    fn upload(name: &str) -> NewUpload {
        NewUpload {
            original_name: name.to_string(),
            data: vec![1, 2, 3, 4],
            title: Some("  My Song ".to_string()),
            artist: None,
        }
    }

    #[test]
    fn test_audio_extension_detection() {
        assert_eq!(audio_extension("track.MP3"), Some("mp3".to_string()));
        assert_eq!(audio_extension("a.b.flac"), Some("flac".to_string()));
        assert_eq!(audio_extension("notes.txt"), None);
        assert_eq!(audio_extension("noext"), None);
    }

    #[tokio::test]
    async fn test_store_song_writes_blob_and_row() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(MemorySongStore::new());
        let service = UploadService::new(store.clone(), temp_dir.path().join("uploads"));

        let song = service.store_song("user-1", upload("demo.mp3")).await.unwrap();

        assert_eq!(song.title, "My Song");
        assert_eq!(song.artist, "Unknown Artist");
        assert_eq!(song.owner, "user-1");
        assert_eq!((song.likes, song.dislikes), (0, 0));
        assert!(song.filename.ends_with(".mp3"));
        assert_eq!(song.media_url, format!("/uploads/{}", song.filename));
        assert!(temp_dir.path().join("uploads").join(&song.filename).exists());
        assert!(store.get_by_id(&song.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rejects_non_audio_and_empty_files() {
        let temp_dir = TempDir::new().unwrap();
        let service = UploadService::new(Arc::new(MemorySongStore::new()), temp_dir.path().to_path_buf());

        assert!(matches!(
            service.store_song("u", upload("evil.exe")).await,
            Err(Error::InvalidInput(_))
        ));

        let empty = NewUpload {
            data: Vec::new(),
            ..upload("empty.mp3")
        };
        assert!(matches!(
            service.store_song("u", empty).await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_list_files_filters_audio() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("b.wav"), b"x").unwrap();
        std::fs::write(temp_dir.path().join("a.ogg"), b"x").unwrap();
        std::fs::write(temp_dir.path().join("readme.txt"), b"x").unwrap();
        std::fs::create_dir(temp_dir.path().join("nested.mp3")).unwrap();

        let service = UploadService::new(Arc::new(MemorySongStore::new()), temp_dir.path().to_path_buf());
        let files = service.list_files().await.unwrap();

        assert_eq!(
            files,
            vec![
                MediaFile { name: "a.ogg".to_string(), url: "/uploads/a.ogg".to_string() },
                MediaFile { name: "b.wav".to_string(), url: "/uploads/b.wav".to_string() },
            ]
        );
    }

    #[tokio::test]
    async fn test_list_files_missing_dir_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let service = UploadService::new(
            Arc::new(MemorySongStore::new()),
            temp_dir.path().join("does-not-exist"),
        );
        assert!(service.list_files().await.unwrap().is_empty());
    }
}

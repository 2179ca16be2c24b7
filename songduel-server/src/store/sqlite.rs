//! SQLite-backed song store

use async_trait::async_trait;
use songduel_common::db::{Song, VoteCounts};
use songduel_common::{time, Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{SongStore, UpdateOutcome};

const SONG_COLUMNS: &str =
    "id, user_id, title, artist, filename, url, likes, dislikes, version, created_at";

#[derive(Clone)]
pub struct SqliteSongStore {
    pool: SqlitePool,
}

impl SqliteSongStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn song_from_row(row: &SqliteRow) -> Result<Song> {
    let created_at: String = row.get("created_at");
    Ok(Song {
        id: row.get("id"),
        owner: row.get("user_id"),
        title: row.get("title"),
        artist: row.get("artist"),
        filename: row.get("filename"),
        media_url: row.get("url"),
        likes: row.get("likes"),
        dislikes: row.get("dislikes"),
        version: row.get("version"),
        created_at: time::from_db_string(&created_at)?,
    })
}

#[async_trait]
impl SongStore for SqliteSongStore {
    async fn get_by_id(&self, id: &str) -> Result<Option<Song>> {
        let sql = format!("SELECT {} FROM songs WHERE id = ?", SONG_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(song_from_row).transpose()
    }

    async fn get_all(&self) -> Result<Vec<Song>> {
        let sql = format!(
            "SELECT {} FROM songs ORDER BY created_at DESC, id ASC",
            SONG_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(song_from_row).collect()
    }

    async fn get_by_owner(&self, owner: &str) -> Result<Vec<Song>> {
        let sql = format!(
            "SELECT {} FROM songs WHERE user_id = ? ORDER BY created_at DESC, id ASC",
            SONG_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(song_from_row).collect()
    }

    async fn conditional_update(
        &self,
        id: &str,
        expected_version: i64,
        counts: VoteCounts,
    ) -> Result<UpdateOutcome> {
        // Single statement: the version check and the write cannot interleave
        // with another writer.
        let sql = format!(
            r#"
            UPDATE songs
            SET likes = ?, dislikes = ?, version = version + 1
            WHERE id = ? AND version = ?
            RETURNING {}
            "#,
            SONG_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(counts.likes)
            .bind(counts.dislikes)
            .bind(id)
            .bind(expected_version)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(UpdateOutcome::Applied(song_from_row(&row)?)),
            None => Ok(UpdateOutcome::Conflict),
        }
    }

    async fn insert(&self, song: &Song) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO songs (
                id, user_id, title, artist, filename, url,
                likes, dislikes, version, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&song.id)
        .bind(&song.owner)
        .bind(&song.title)
        .bind(&song.artist)
        .bind(&song.filename)
        .bind(&song.media_url)
        .bind(song.likes)
        .bind(song.dislikes)
        .bind(song.version)
        .bind(time::to_db_string(&song.created_at))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
                Error::InvalidInput(format!("Song id already exists: {}", song.id)),
            ),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use songduel_common::db::init_memory_database;

    async fn store() -> SqliteSongStore {
        SqliteSongStore::new(init_memory_database().await.unwrap())
    }

    fn song(title: &str) -> Song {
        Song::new("owner-1", title, "Artist", format!("{}.mp3", title), format!("/uploads/{}.mp3", title))
    }

    #[tokio::test]
    async fn test_insert_and_get_by_id() {
        let store = store().await;
        let song = song("first");
        store.insert(&song).await.unwrap();

        let loaded = store.get_by_id(&song.id).await.unwrap().unwrap();
        assert_eq!(loaded.title, "first");
        assert_eq!(loaded.likes, 0);
        assert_eq!(loaded.created_at.timestamp_micros(), song.created_at.timestamp_micros());
        assert!(store.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let store = store().await;
        let song = song("first");
        store.insert(&song).await.unwrap();

        assert!(matches!(store.insert(&song).await, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_get_all_newest_first() {
        let store = store().await;
        let mut older = song("older");
        older.created_at = time::from_db_string("2024-01-01T00:00:00.000000Z").unwrap();
        let mut newer = song("newer");
        newer.created_at = time::from_db_string("2024-06-01T00:00:00.000000Z").unwrap();
        store.insert(&older).await.unwrap();
        store.insert(&newer).await.unwrap();

        let titles: Vec<String> = store
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["newer", "older"]);
    }

    #[tokio::test]
    async fn test_get_by_owner_filters() {
        let store = store().await;
        store.insert(&song("mine")).await.unwrap();
        let mut theirs = song("theirs");
        theirs.owner = "owner-2".to_string();
        store.insert(&theirs).await.unwrap();

        let mine = store.get_by_owner("owner-1").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].title, "mine");
    }

    #[tokio::test]
    async fn test_conditional_update_checks_version() {
        let store = store().await;
        let song = song("cas");
        store.insert(&song).await.unwrap();

        let counts = VoteCounts { likes: 1, dislikes: 0 };
        let applied = store.conditional_update(&song.id, 0, counts).await.unwrap();
        match applied {
            UpdateOutcome::Applied(updated) => {
                assert_eq!(updated.likes, 1);
                assert_eq!(updated.version, 1);
            }
            UpdateOutcome::Conflict => panic!("first write should apply"),
        }

        // Stale version loses
        let stale = store.conditional_update(&song.id, 0, counts).await.unwrap();
        assert_eq!(stale, UpdateOutcome::Conflict);

        let unknown = store.conditional_update("missing", 0, counts).await.unwrap();
        assert_eq!(unknown, UpdateOutcome::Conflict);
    }
}

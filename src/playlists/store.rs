//! SQLite-backed playlist store implementation.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::catalog::{AudioFeatures, Catalog, Playlist, Song};

use super::schema::{
    CREATE_AUDIO_FEATURES_TABLE, CREATE_LIBRARY_INDICES, CREATE_PLAYLISTS_TABLE,
    CREATE_PLAYLIST_SONGS_TABLE, CREATE_SONGS_TABLE, LIBRARY_DB_VERSION,
};
use super::PlaylistStore;

/// SQLite-backed store for playlists, songs and their audio features.
pub struct SqlitePlaylistStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqlitePlaylistStore {
    /// Open an existing database or create a new one with the current schema.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open library db at {:?}", db_path.as_ref()))?;
        conn.execute("PRAGMA foreign_keys = ON;", [])?;

        let version: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;

        if version == 0 {
            conn.execute(CREATE_SONGS_TABLE, [])?;
            conn.execute(CREATE_AUDIO_FEATURES_TABLE, [])?;
            conn.execute(CREATE_PLAYLISTS_TABLE, [])?;
            conn.execute(CREATE_PLAYLIST_SONGS_TABLE, [])?;
            for index in CREATE_LIBRARY_INDICES {
                conn.execute(index, [])?;
            }
            conn.pragma_update(None, "user_version", LIBRARY_DB_VERSION)?;
            info!(
                "Created library database at {:?} (version {})",
                db_path.as_ref(),
                LIBRARY_DB_VERSION
            );
        } else if version != LIBRARY_DB_VERSION {
            bail!(
                "Library database version {} is not supported (expected {})",
                version,
                LIBRARY_DB_VERSION
            );
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn row_to_song(row: &rusqlite::Row<'_>) -> rusqlite::Result<Song> {
        let catalog: String = row.get("catalog")?;
        let features = match row.get::<_, Option<f64>>("danceability")? {
            Some(danceability) => Some(AudioFeatures {
                danceability,
                energy: row.get("energy")?,
                valence: row.get("valence")?,
                tempo_bpm: row.get("tempo_bpm")?,
                loudness_db: row.get("loudness_db")?,
                acousticness: row.get("acousticness")?,
                instrumentalness: row.get("instrumentalness")?,
                liveness: row.get("liveness")?,
                speechiness: row.get("speechiness")?,
            }),
            None => None,
        };
        Ok(Song {
            id: row.get("id")?,
            title: row.get("title")?,
            artist: row.get("artist")?,
            album: row.get("album")?,
            duration_seconds: row.get::<_, i64>("duration_seconds")? as u32,
            genre: row.get("genre")?,
            release_year: row.get("release_year")?,
            catalog: Catalog::from_str(&catalog).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    format!("unknown catalog '{}'", catalog).into(),
                )
            })?,
            catalog_track_id: row.get("catalog_track_id")?,
            audio_features: features,
        })
    }
}

const SONG_SELECT: &str = "
SELECT s.id, s.title, s.artist, s.album, s.duration_seconds, s.genre,
       s.release_year, s.catalog, s.catalog_track_id,
       f.danceability, f.energy, f.valence, f.tempo_bpm, f.loudness_db,
       f.acousticness, f.instrumentalness, f.liveness, f.speechiness
FROM songs s LEFT JOIN audio_features f ON f.song_id = s.id
";

impl PlaylistStore for SqlitePlaylistStore {
    fn get_playlist(&self, id: &str) -> Result<Option<Playlist>> {
        let conn = self.conn.lock().unwrap();
        let playlist = conn
            .query_row(
                "SELECT id, name, description, catalog FROM playlists WHERE id = ?1",
                params![id],
                |row| {
                    let catalog: String = row.get(3)?;
                    Ok(Playlist {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                        catalog: Catalog::from_str(&catalog).ok_or_else(|| {
                            rusqlite::Error::FromSqlConversionFailure(
                                3,
                                rusqlite::types::Type::Text,
                                format!("unknown catalog '{}'", catalog).into(),
                            )
                        })?,
                        song_ids: Vec::new(),
                    })
                },
            )
            .optional()
            .context("Failed to load playlist")?;

        match playlist {
            Some(mut playlist) => {
                let mut stmt = conn.prepare(
                    "SELECT song_id FROM playlist_songs WHERE playlist_id = ?1 ORDER BY position",
                )?;
                playlist.song_ids = stmt
                    .query_map(params![id], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<String>>>()?;
                Ok(Some(playlist))
            }
            None => Ok(None),
        }
    }

    fn load_playlist_songs(&self, id: &str) -> Result<Vec<Song>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "{} JOIN playlist_songs ps ON ps.song_id = s.id
             WHERE ps.playlist_id = ?1 ORDER BY ps.position",
            SONG_SELECT
        );
        let mut stmt = conn.prepare(&sql)?;
        let songs = stmt
            .query_map(params![id], Self::row_to_song)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(songs)
    }

    fn create_playlist(&self, playlist: &Playlist) -> Result<()> {
        let mut guard = self.conn.lock().unwrap();
        let tx = guard.transaction()?;
        tx.execute(
            "INSERT INTO playlists (id, name, description, catalog) VALUES (?1, ?2, ?3, ?4)",
            params![
                playlist.id,
                playlist.name,
                playlist.description,
                playlist.catalog.as_str()
            ],
        )?;
        for (position, song_id) in playlist.song_ids.iter().enumerate() {
            tx.execute(
                "INSERT INTO playlist_songs (playlist_id, position, song_id) VALUES (?1, ?2, ?3)",
                params![playlist.id, position as i64, song_id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn upsert_song(&self, song: &Song) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO songs
             (id, title, artist, album, duration_seconds, genre, release_year,
              catalog, catalog_track_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT (id) DO UPDATE SET
               title = excluded.title, artist = excluded.artist,
               album = excluded.album, duration_seconds = excluded.duration_seconds,
               genre = excluded.genre, release_year = excluded.release_year",
            params![
                song.id,
                song.title,
                song.artist,
                song.album,
                song.duration_seconds as i64,
                song.genre,
                song.release_year,
                song.catalog.as_str(),
                song.catalog_track_id,
            ],
        )?;
        drop(conn);

        if let Some(features) = &song.audio_features {
            self.attach_audio_features(&song.id, features)?;
        }
        Ok(())
    }

    fn attach_audio_features(&self, song_id: &str, features: &AudioFeatures) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO audio_features
             (song_id, danceability, energy, valence, tempo_bpm, loudness_db,
              acousticness, instrumentalness, liveness, speechiness)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT (song_id) DO UPDATE SET
               danceability = excluded.danceability, energy = excluded.energy,
               valence = excluded.valence, tempo_bpm = excluded.tempo_bpm,
               loudness_db = excluded.loudness_db, acousticness = excluded.acousticness,
               instrumentalness = excluded.instrumentalness, liveness = excluded.liveness,
               speechiness = excluded.speechiness",
            params![
                song_id,
                features.danceability,
                features.energy,
                features.valence,
                features.tempo_bpm,
                features.loudness_db,
                features.acousticness,
                features.instrumentalness,
                features.liveness,
                features.speechiness,
            ],
        )?;
        Ok(())
    }

    fn all_songs(&self) -> Result<Vec<Song>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!("{} ORDER BY s.id", SONG_SELECT);
        let mut stmt = conn.prepare(&sql)?;
        let songs = stmt
            .query_map([], Self::row_to_song)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(songs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_store() -> (TempDir, SqlitePlaylistStore) {
        let dir = TempDir::new().unwrap();
        let store = SqlitePlaylistStore::new(dir.path().join("library.db")).unwrap();
        (dir, store)
    }

    fn song(id: &str, title: &str) -> Song {
        Song::new(id, title, "Artist", 200, Catalog::Spotify, format!("sp-{}", id))
    }

    #[test]
    fn test_playlist_round_trip_preserves_order() {
        let (_dir, store) = make_store();
        for (id, title) in [("s1", "One"), ("s2", "Two"), ("s3", "Three")] {
            store.upsert_song(&song(id, title)).unwrap();
        }
        store
            .create_playlist(&Playlist {
                id: "p1".to_string(),
                name: "Road Trip".to_string(),
                description: None,
                catalog: Catalog::Spotify,
                song_ids: vec!["s3".to_string(), "s1".to_string(), "s2".to_string()],
            })
            .unwrap();

        let playlist = store.get_playlist("p1").unwrap().unwrap();
        assert_eq!(playlist.song_ids, vec!["s3", "s1", "s2"]);

        let songs = store.load_playlist_songs("p1").unwrap();
        let titles: Vec<&str> = songs.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Three", "One", "Two"]);
    }

    #[test]
    fn test_missing_playlist() {
        let (_dir, store) = make_store();
        assert!(store.get_playlist("nope").unwrap().is_none());
        assert!(store.load_playlist_songs("nope").unwrap().is_empty());
    }

    #[test]
    fn test_audio_features_attach_lazily() {
        let (_dir, store) = make_store();
        store.upsert_song(&song("s1", "One")).unwrap();

        let loaded = store.all_songs().unwrap();
        assert!(loaded[0].audio_features.is_none());

        store
            .attach_audio_features("s1", &AudioFeatures::default())
            .unwrap();
        let loaded = store.all_songs().unwrap();
        let features = loaded[0].audio_features.expect("features attached");
        assert_eq!(features.tempo_bpm, 120.0);
    }

    #[test]
    fn test_upsert_song_updates_metadata() {
        let (_dir, store) = make_store();
        store.upsert_song(&song("s1", "One")).unwrap();
        store
            .upsert_song(&song("s1", "One (Deluxe)").with_release_year(1999))
            .unwrap();

        let songs = store.all_songs().unwrap();
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].title, "One (Deluxe)");
        assert_eq!(songs[0].release_year, Some(1999));
    }
}

//! SQLite schema for the local library database.

/// Current schema version, written to `PRAGMA user_version`.
pub const LIBRARY_DB_VERSION: i64 = 1;

pub const CREATE_SONGS_TABLE: &str = "
CREATE TABLE songs (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    artist TEXT NOT NULL,
    album TEXT,
    duration_seconds INTEGER NOT NULL,
    genre TEXT,
    release_year INTEGER,
    catalog TEXT NOT NULL,
    catalog_track_id TEXT NOT NULL,
    UNIQUE (catalog, catalog_track_id)
);
";

/// Audio descriptors, attached lazily after a song is known.
pub const CREATE_AUDIO_FEATURES_TABLE: &str = "
CREATE TABLE audio_features (
    song_id TEXT PRIMARY KEY REFERENCES songs(id) ON DELETE CASCADE,
    danceability REAL NOT NULL,
    energy REAL NOT NULL,
    valence REAL NOT NULL,
    tempo_bpm REAL NOT NULL,
    loudness_db REAL NOT NULL,
    acousticness REAL NOT NULL,
    instrumentalness REAL NOT NULL,
    liveness REAL NOT NULL,
    speechiness REAL NOT NULL
);
";

pub const CREATE_PLAYLISTS_TABLE: &str = "
CREATE TABLE playlists (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    catalog TEXT NOT NULL
);
";

pub const CREATE_PLAYLIST_SONGS_TABLE: &str = "
CREATE TABLE playlist_songs (
    playlist_id TEXT NOT NULL REFERENCES playlists(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    song_id TEXT NOT NULL REFERENCES songs(id),
    PRIMARY KEY (playlist_id, position)
);
";

pub const CREATE_LIBRARY_INDICES: &[&str] = &[
    "CREATE INDEX idx_songs_artist ON songs(artist);",
    "CREATE INDEX idx_playlist_songs_song ON playlist_songs(song_id);",
];

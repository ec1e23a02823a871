//! SQLite schema for the conversions database.

/// Current schema version, written to `PRAGMA user_version`.
pub const CONVERSIONS_DB_VERSION: i64 = 1;

/// Conversion records. The partial unique index is what makes the
/// one-active-conversion-per-(playlist, target) invariant atomic: a second
/// insert for the same pair fails at the constraint while a FAILED record
/// never blocks a retry.
pub const CREATE_CONVERSIONS_TABLE: &str = "
CREATE TABLE conversions (
    id TEXT PRIMARY KEY,
    source_playlist_id TEXT NOT NULL,
    target_catalog TEXT NOT NULL,
    status TEXT NOT NULL,
    matched_count INTEGER NOT NULL DEFAULT 0,
    unmatched_count INTEGER NOT NULL DEFAULT 0,
    conversion_rate REAL NOT NULL DEFAULT 0,
    failure TEXT,
    external_playlist_id TEXT,
    requested_by_user_id TEXT,
    created_at INTEGER NOT NULL,
    completed_at INTEGER
);
";

pub const CREATE_CONVERSIONS_INDICES: &[&str] = &[
    "CREATE UNIQUE INDEX idx_conversions_active
     ON conversions(source_playlist_id, target_catalog)
     WHERE status != 'FAILED';",
    "CREATE INDEX idx_conversions_playlist ON conversions(source_playlist_id);",
    "CREATE INDEX idx_conversions_status ON conversions(status);",
];

/// Per-unmatched-song error rows, owned by their conversion record.
pub const CREATE_SONG_ERRORS_TABLE: &str = "
CREATE TABLE conversion_song_errors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    conversion_id TEXT NOT NULL REFERENCES conversions(id) ON DELETE CASCADE,
    song_id TEXT NOT NULL,
    song_title TEXT NOT NULL,
    reason TEXT NOT NULL,
    position INTEGER NOT NULL
);
";

pub const CREATE_SONG_ERRORS_INDICES: &[&str] =
    &["CREATE INDEX idx_song_errors_conversion ON conversion_song_errors(conversion_id);"];

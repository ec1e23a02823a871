//! Core data models shared across the matching, conversion and
//! recommendation engines.

use serde::{Deserialize, Serialize};

/// A known external music-streaming catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Catalog {
    Spotify,
    AppleMusic,
    Deezer,
    Youtube,
}

impl Catalog {
    pub fn as_str(&self) -> &'static str {
        match self {
            Catalog::Spotify => "SPOTIFY",
            Catalog::AppleMusic => "APPLE_MUSIC",
            Catalog::Deezer => "DEEZER",
            Catalog::Youtube => "YOUTUBE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "SPOTIFY" => Some(Catalog::Spotify),
            "APPLE_MUSIC" => Some(Catalog::AppleMusic),
            "DEEZER" => Some(Catalog::Deezer),
            "YOUTUBE" => Some(Catalog::Youtube),
            _ => None,
        }
    }
}

impl std::fmt::Display for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata-derived audio descriptors for a song.
///
/// Most values live in [0, 1]; tempo is in BPM and loudness in dB, both
/// unbounded but typically ranged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub danceability: f64,
    pub energy: f64,
    pub valence: f64,
    pub tempo_bpm: f64,
    pub loudness_db: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub speechiness: f64,
}

impl Default for AudioFeatures {
    fn default() -> Self {
        Self {
            danceability: 0.5,
            energy: 0.5,
            valence: 0.5,
            tempo_bpm: 120.0,
            loudness_db: -10.0,
            acousticness: 0.5,
            instrumentalness: 0.0,
            liveness: 0.1,
            speechiness: 0.05,
        }
    }
}

/// A song as known to one catalog.
///
/// Songs are identified by (catalog, catalog_track_id) and are immutable
/// once matched; audio features may be attached lazily via the playlist
/// store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub duration_seconds: u32,
    pub genre: Option<String>,
    pub release_year: Option<i32>,
    pub catalog: Catalog,
    pub catalog_track_id: String,
    pub audio_features: Option<AudioFeatures>,
}

impl Song {
    /// Create a song with the required fields; optional metadata is attached
    /// with the `with_` builders.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        duration_seconds: u32,
        catalog: Catalog,
        catalog_track_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            album: None,
            duration_seconds,
            genre: None,
            release_year: None,
            catalog,
            catalog_track_id: catalog_track_id.into(),
            audio_features: None,
        }
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_release_year(mut self, year: i32) -> Self {
        self.release_year = Some(year);
        self
    }

    pub fn with_audio_features(mut self, features: AudioFeatures) -> Self {
        self.audio_features = Some(features);
        self
    }
}

/// A playlist held by the local playlist store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub catalog: Catalog,
    /// Song IDs in playback order.
    pub song_ids: Vec<String>,
}

//! Local playlist and song persistence.
//!
//! The persistence collaborator consumed by the conversion orchestrator and
//! the recommendation routes. Songs are created once per (catalog, track)
//! and never mutated afterwards except to attach audio features.

mod schema;
mod store;

use anyhow::Result;

use crate::catalog::{AudioFeatures, Playlist, Song};

pub use store::SqlitePlaylistStore;

/// Trait for playlist storage backends.
pub trait PlaylistStore: Send + Sync {
    /// Get a playlist with its ordered song IDs.
    fn get_playlist(&self, id: &str) -> Result<Option<Playlist>>;

    /// Load a playlist's songs in playback order, features included.
    fn load_playlist_songs(&self, id: &str) -> Result<Vec<Song>>;

    /// Create a playlist referencing already-stored songs.
    fn create_playlist(&self, playlist: &Playlist) -> Result<()>;

    /// Insert or update a song (and its features, when present).
    fn upsert_song(&self, song: &Song) -> Result<()>;

    /// Attach or replace audio features for a stored song.
    fn attach_audio_features(&self, song_id: &str, features: &AudioFeatures) -> Result<()>;

    /// Every stored song; the recommendation candidate pool.
    fn all_songs(&self) -> Result<Vec<Song>>;
}

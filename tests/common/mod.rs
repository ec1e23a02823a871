//! Shared fixtures for integration tests.
//!
//! Provides a scripted mock catalog client and tempfile-backed stores so
//! conversion flows can run end to end without a network.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use crosstune::catalog::{
    Catalog, CatalogClient, CatalogClientRegistry, CatalogError, Playlist, Song,
};
use crosstune::compatibility::CompatibilityAnalyzer;
use crosstune::conversion::{
    ConversionOrchestrator, ConversionSettings, SqliteConversionStore,
};
use crosstune::matching::{MatcherSettings, SongMatcher};
use crosstune::playlists::{PlaylistStore, SqlitePlaylistStore};

/// A playlist created on the mock catalog.
#[derive(Debug, Clone)]
pub struct CreatedPlaylist {
    pub id: String,
    pub name: String,
    /// One entry per add_tracks call, in call order.
    pub batches: Vec<Vec<String>>,
}

/// Scripted catalog client.
///
/// Search matches any universe song whose full title appears in the query
/// (case-insensitive); songs without a counterpart in the universe simply
/// return no candidates, which is the "unmatched" path.
pub struct MockCatalogClient {
    catalog: Catalog,
    universe: Vec<Song>,
    access_token: Option<String>,
    fail_create: bool,
    search_delay: Option<Duration>,
    pub search_count: Mutex<usize>,
    pub created: Mutex<Vec<CreatedPlaylist>>,
}

impl MockCatalogClient {
    pub fn new(catalog: Catalog, universe: Vec<Song>) -> Self {
        Self {
            catalog,
            universe,
            access_token: Some("token-1".to_string()),
            fail_create: false,
            search_delay: None,
            search_count: Mutex::new(0),
            created: Mutex::new(Vec::new()),
        }
    }

    pub fn without_credentials(mut self) -> Self {
        self.access_token = None;
        self
    }

    pub fn failing_playlist_creation(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn with_search_delay(mut self, delay: Duration) -> Self {
        self.search_delay = Some(delay);
        self
    }

    pub fn searches(&self) -> usize {
        *self.search_count.lock().unwrap()
    }

    pub fn created_playlists(&self) -> Vec<CreatedPlaylist> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogClient for MockCatalogClient {
    fn catalog(&self) -> Catalog {
        self.catalog
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Song>, CatalogError> {
        *self.search_count.lock().unwrap() += 1;
        if let Some(delay) = self.search_delay {
            tokio::time::sleep(delay).await;
        }

        let query = query.to_lowercase();
        Ok(self
            .universe
            .iter()
            .filter(|s| query.contains(&s.title.to_lowercase()))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_access_token(&self, _user_id: &str) -> Result<Option<String>, CatalogError> {
        Ok(self.access_token.clone())
    }

    async fn create_playlist(
        &self,
        _access_token: &str,
        name: &str,
        _description: Option<&str>,
    ) -> Result<String, CatalogError> {
        if self.fail_create {
            return Err(CatalogError::Status {
                status: 502,
                endpoint: "playlists".to_string(),
            });
        }
        let mut created = self.created.lock().unwrap();
        let id = format!("ext-{}", created.len() + 1);
        created.push(CreatedPlaylist {
            id: id.clone(),
            name: name.to_string(),
            batches: Vec::new(),
        });
        Ok(id)
    }

    async fn add_tracks(
        &self,
        _access_token: &str,
        external_playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), CatalogError> {
        let mut created = self.created.lock().unwrap();
        let playlist = created
            .iter_mut()
            .find(|p| p.id == external_playlist_id)
            .expect("unknown external playlist");
        playlist.batches.push(track_ids.to_vec());
        Ok(())
    }
}

/// A source song on Spotify.
pub fn source_song(index: usize, title: &str) -> Song {
    Song::new(
        format!("src-{}", index),
        title,
        format!("Artist {}", index),
        180 + (index as u32 % 5) * 10,
        Catalog::Spotify,
        format!("sp-{}", index),
    )
    .with_genre(["rock", "pop", "soul", "funk"][index % 4])
    .with_release_year(2005 + (index as i32 % 15))
}

/// The target-catalog counterpart of a source song: same metadata, its own
/// catalog track ID.
pub fn counterpart(source: &Song, catalog: Catalog) -> Song {
    let mut song = source.clone();
    song.id = format!("{}-{}", catalog.as_str().to_lowercase(), source.id);
    song.catalog = catalog;
    song.catalog_track_id = format!("tgt-{}", source.id);
    song
}

/// Test stores backed by a temp directory, plus a playlist of `titles`
/// stored in order.
pub struct TestHarness {
    pub conversions: Arc<SqliteConversionStore>,
    pub playlists: Arc<SqlitePlaylistStore>,
    _temp_dir: TempDir,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let conversions = Arc::new(
            SqliteConversionStore::new(temp_dir.path().join("conversions.db")).unwrap(),
        );
        let playlists =
            Arc::new(SqlitePlaylistStore::new(temp_dir.path().join("library.db")).unwrap());
        Self {
            conversions,
            playlists,
            _temp_dir: temp_dir,
        }
    }

    /// Store `songs` and a playlist referencing them in order.
    pub fn store_playlist(&self, id: &str, name: &str, songs: &[Song]) {
        for song in songs {
            self.playlists.upsert_song(song).unwrap();
        }
        self.playlists
            .create_playlist(&Playlist {
                id: id.to_string(),
                name: name.to_string(),
                description: None,
                catalog: Catalog::Spotify,
                song_ids: songs.iter().map(|s| s.id.clone()).collect(),
            })
            .unwrap();
    }

    /// Orchestrator wired to the given client with fast test settings.
    pub fn orchestrator(&self, client: Arc<MockCatalogClient>) -> ConversionOrchestrator {
        self.orchestrator_with_settings(client, ConversionSettings::default())
    }

    pub fn orchestrator_with_settings(
        &self,
        client: Arc<MockCatalogClient>,
        settings: ConversionSettings,
    ) -> ConversionOrchestrator {
        let mut registry = CatalogClientRegistry::new();
        registry.register(client);

        let matcher_settings = MatcherSettings {
            search_timeout_secs: 2,
            ..MatcherSettings::default()
        };

        ConversionOrchestrator::new(
            self.conversions.clone(),
            self.playlists.clone(),
            Arc::new(registry),
            SongMatcher::new(matcher_settings),
            CompatibilityAnalyzer::with_defaults(),
            settings,
        )
    }
}

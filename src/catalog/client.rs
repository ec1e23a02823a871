//! CatalogClient trait definition.
//!
//! One implementation exists per external platform; the matching and
//! conversion engines only ever see the trait.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::models::{Catalog, Song};

/// Errors surfaced by catalog clients.
///
/// All of these are transient from the matcher's point of view (a failing
/// search is skipped); during target-playlist creation they are terminal.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {endpoint}")]
    Status { status: u16, endpoint: String },

    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Capability interface to one external music-streaming platform.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// The catalog this client talks to.
    fn catalog(&self) -> Catalog;

    /// Run a text search and return up to `limit` candidate songs.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Song>, CatalogError>;

    /// Resolve a usable access token for the given user.
    ///
    /// `Ok(None)` means "no usable credential" and blocks a conversion; it is
    /// not a transport error.
    async fn get_access_token(&self, user_id: &str) -> Result<Option<String>, CatalogError>;

    /// Create a playlist on the external platform, returning its external ID.
    async fn create_playlist(
        &self,
        access_token: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<String, CatalogError>;

    /// Add tracks to an external playlist. Callers pass pre-chunked batches.
    async fn add_tracks(
        &self,
        access_token: &str,
        external_playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), CatalogError>;
}

/// Registry mapping each catalog to its configured client.
#[derive(Default)]
pub struct CatalogClientRegistry {
    clients: HashMap<Catalog, Arc<dyn CatalogClient>>,
}

impl CatalogClientRegistry {
    pub fn new() -> Self {
        Self {
            clients: HashMap::new(),
        }
    }

    pub fn register(&mut self, client: Arc<dyn CatalogClient>) {
        self.clients.insert(client.catalog(), client);
    }

    pub fn get(&self, catalog: Catalog) -> Option<Arc<dyn CatalogClient>> {
        self.clients.get(&catalog).cloned()
    }

    /// Catalogs with a configured client.
    pub fn catalogs(&self) -> Vec<Catalog> {
        let mut catalogs: Vec<Catalog> = self.clients.keys().copied().collect();
        catalogs.sort_by_key(|c| c.as_str());
        catalogs
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DummyClient(Catalog);

    #[async_trait]
    impl CatalogClient for DummyClient {
        fn catalog(&self) -> Catalog {
            self.0
        }

        async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<Song>, CatalogError> {
            Ok(Vec::new())
        }

        async fn get_access_token(&self, _user_id: &str) -> Result<Option<String>, CatalogError> {
            Ok(None)
        }

        async fn create_playlist(
            &self,
            _access_token: &str,
            _name: &str,
            _description: Option<&str>,
        ) -> Result<String, CatalogError> {
            Ok("ext-1".to_string())
        }

        async fn add_tracks(
            &self,
            _access_token: &str,
            _external_playlist_id: &str,
            _track_ids: &[String],
        ) -> Result<(), CatalogError> {
            Ok(())
        }
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = CatalogClientRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get(Catalog::Spotify).is_none());

        registry.register(Arc::new(DummyClient(Catalog::Spotify)));
        registry.register(Arc::new(DummyClient(Catalog::Deezer)));

        assert!(registry.get(Catalog::Spotify).is_some());
        assert!(registry.get(Catalog::AppleMusic).is_none());
        assert_eq!(
            registry.catalogs(),
            vec![Catalog::Deezer, Catalog::Spotify]
        );
    }
}

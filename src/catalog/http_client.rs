//! HTTP-backed catalog client.
//!
//! Talks to a per-platform bridge service that wraps the platform's real
//! search/playlist API behind a small uniform surface. The conversion core
//! only ever sees the `CatalogClient` trait.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::client::{CatalogClient, CatalogError};
use super::models::{Catalog, Song};

/// Client for one platform bridge endpoint.
pub struct HttpCatalogClient {
    catalog: Catalog,
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    results: Vec<Song>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Serialize)]
struct CreatePlaylistBody<'a> {
    name: &'a str,
    description: Option<&'a str>,
}

#[derive(Deserialize)]
struct CreatePlaylistResponse {
    playlist_id: String,
}

#[derive(Serialize)]
struct AddTracksBody<'a> {
    track_ids: &'a [String],
}

impl HttpCatalogClient {
    /// Create a new client for a platform bridge.
    ///
    /// # Arguments
    /// * `catalog` - The catalog this bridge fronts
    /// * `base_url` - Base URL of the bridge service (e.g. "http://localhost:9100")
    /// * `timeout_sec` - Request timeout in seconds
    pub fn new(catalog: Catalog, base_url: String, timeout_sec: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .expect("Failed to create HTTP client");

        // Ensure base_url doesn't have trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        Self {
            catalog,
            client,
            base_url,
        }
    }

    fn check_status(response: &reqwest::Response, endpoint: &str) -> Result<(), CatalogError> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(CatalogError::Status {
                status: response.status().as_u16(),
                endpoint: endpoint.to_string(),
            })
        }
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    fn catalog(&self) -> Catalog {
        self.catalog
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Song>, CatalogError> {
        let url = format!(
            "{}/search?q={}&limit={}",
            self.base_url,
            urlencoding::encode(query),
            limit
        );
        let response = self.client.get(&url).send().await?;
        Self::check_status(&response, "search")?;

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Decode(e.to_string()))?;
        Ok(body.results)
    }

    async fn get_access_token(&self, user_id: &str) -> Result<Option<String>, CatalogError> {
        let url = format!(
            "{}/token/{}",
            self.base_url,
            urlencoding::encode(user_id)
        );
        let response = self.client.get(&url).send().await?;

        // The bridge reports a missing credential as 404; that is a normal
        // "no usable credential" outcome, not a transport failure.
        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        Self::check_status(&response, "token")?;

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Decode(e.to_string()))?;
        Ok(body.access_token)
    }

    async fn create_playlist(
        &self,
        access_token: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<String, CatalogError> {
        let url = format!("{}/playlists", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .json(&CreatePlaylistBody { name, description })
            .send()
            .await?;
        Self::check_status(&response, "playlists")?;

        let body: CreatePlaylistResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Decode(e.to_string()))?;
        Ok(body.playlist_id)
    }

    async fn add_tracks(
        &self,
        access_token: &str,
        external_playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), CatalogError> {
        let url = format!(
            "{}/playlists/{}/tracks",
            self.base_url,
            urlencoding::encode(external_playlist_id)
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .json(&AddTracksBody { track_ids })
            .send()
            .await?;
        Self::check_status(&response, "tracks")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let client =
            HttpCatalogClient::new(Catalog::Spotify, "http://localhost:9100/".to_string(), 10);
        assert_eq!(client.base_url, "http://localhost:9100");
        assert_eq!(client.catalog(), Catalog::Spotify);
    }
}

//! Conversion orchestration.
//!
//! Coordinates the song matcher over every song in a playlist: idempotency
//! check, compatibility gate, bounded parallel matching, target playlist
//! creation, and terminal record persistence. Owns the record row for the
//! duration of one conversion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::catalog::{Catalog, CatalogClient, CatalogClientRegistry, Playlist, Song};
use crate::compatibility::CompatibilityAnalyzer;
use crate::matching::{SongMatch, SongMatcher};
use crate::playlists::PlaylistStore;

use super::error::ConversionError;
use super::models::{ConversionOutcome, ConversionRecord, SongConversionError};
use super::store::ConversionStore;

/// Tunables for the conversion driver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversionSettings {
    /// Songs matched concurrently. Bounded to respect external rate limits.
    pub worker_count: usize,
    /// Track IDs added to the target playlist per external call.
    pub track_batch_size: usize,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            worker_count: 4,
            track_batch_size: 100,
        }
    }
}

/// Drives playlist conversions end to end.
pub struct ConversionOrchestrator {
    conversions: Arc<dyn ConversionStore>,
    playlists: Arc<dyn PlaylistStore>,
    clients: Arc<CatalogClientRegistry>,
    matcher: SongMatcher,
    analyzer: CompatibilityAnalyzer,
    settings: ConversionSettings,
    /// Cancellation tokens for conversions currently in PROCESSING.
    active: Mutex<HashMap<String, CancellationToken>>,
}

impl ConversionOrchestrator {
    pub fn new(
        conversions: Arc<dyn ConversionStore>,
        playlists: Arc<dyn PlaylistStore>,
        clients: Arc<CatalogClientRegistry>,
        matcher: SongMatcher,
        analyzer: CompatibilityAnalyzer,
        settings: ConversionSettings,
    ) -> Self {
        Self {
            conversions,
            playlists,
            clients,
            matcher,
            analyzer,
            settings,
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Convert `playlist_id` to `target` on behalf of `user_id`.
    ///
    /// Duplicate and unknown-playlist requests are rejected with a typed
    /// error before any record exists. Every admitted conversion returns a
    /// record, completed or failed, never a bare error, so callers can
    /// always render match statistics.
    pub async fn convert(
        &self,
        playlist_id: &str,
        target: Catalog,
        user_id: &str,
    ) -> Result<ConversionRecord, ConversionError> {
        let playlist = self
            .playlists
            .get_playlist(playlist_id)?
            .ok_or_else(|| ConversionError::PlaylistNotFound(playlist_id.to_string()))?;
        let songs = self.playlists.load_playlist_songs(playlist_id)?;

        let client = self.clients.get(target).ok_or_else(|| {
            ConversionError::ExternalCatalog(format!("no client registered for {}", target))
        })?;

        let record = ConversionRecord::new(
            uuid::Uuid::new_v4().to_string(),
            playlist_id,
            target,
        )
        .with_user(user_id);

        if !self.conversions.try_create(&record)? {
            let existing_id = self
                .conversions
                .find_active(playlist_id, target)?
                .map(|r| r.id)
                .unwrap_or_default();
            return Err(ConversionError::DuplicateConversion { existing_id });
        }

        info!(
            "Conversion {} admitted: '{}' ({} songs) -> {}",
            record.id,
            playlist.name,
            songs.len(),
            target
        );

        // Pre-flight gate: cheap heuristic before burning rate-limited calls
        let report = self.analyzer.analyze(&songs, target);
        let min_score = self.analyzer.rules().min_score;
        if report.score < min_score {
            let reason = ConversionError::LowCompatibility {
                score: report.score,
                min_score,
            };
            let detail = format!("{} ({})", reason, report.issues.join("; "));
            warn!("Conversion {} rejected by gate: {}", record.id, detail);
            self.conversions.mark_failed(&record.id, &detail)?;
            return self.reload(&record.id);
        }

        self.conversions.mark_processing(&record.id)?;
        let cancel = CancellationToken::new();
        self.active
            .lock()
            .unwrap()
            .insert(record.id.clone(), cancel.clone());

        let result = self
            .run_matching_phase(&record.id, &playlist, &songs, user_id, client, &cancel)
            .await;

        self.active.lock().unwrap().remove(&record.id);

        match result {
            Ok(outcome) => {
                info!(
                    "Conversion {} completed: {}/{} matched",
                    record.id,
                    outcome.matched_count,
                    outcome.matched_count + outcome.unmatched_count
                );
                self.conversions.mark_completed(&record.id, &outcome)?;
            }
            Err(reason) => {
                warn!("Conversion {} failed: {}", record.id, reason);
                self.conversions.mark_failed(&record.id, &reason)?;
            }
        }

        self.reload(&record.id)
    }

    /// Cancel a conversion in PROCESSING. In-flight external calls drain;
    /// no further per-song matches are started. Returns false if the
    /// conversion is unknown or already terminal.
    pub fn cancel(&self, conversion_id: &str) -> bool {
        let active = self.active.lock().unwrap();
        match active.get(conversion_id) {
            Some(token) => {
                info!("Cancelling conversion {}", conversion_id);
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Run matching plus target playlist creation; Err carries the top-level
    /// failure reason for the record.
    async fn run_matching_phase(
        &self,
        conversion_id: &str,
        playlist: &Playlist,
        songs: &[Song],
        user_id: &str,
        client: Arc<dyn CatalogClient>,
        cancel: &CancellationToken,
    ) -> Result<ConversionOutcome, String> {
        // Bounded fan-out; `buffered` preserves playlist order in the output
        let matches: Vec<Option<SongMatch>> = stream::iter(songs.iter().cloned())
            .map(|song| {
                let matcher = self.matcher.clone();
                let client = client.clone();
                let cancel = cancel.clone();
                async move {
                    if cancel.is_cancelled() {
                        return None;
                    }
                    Some(matcher.match_song(&song, client.as_ref()).await)
                }
            })
            .buffered(self.settings.worker_count.max(1))
            .collect()
            .await;

        if cancel.is_cancelled() {
            return Err(ConversionError::Cancelled.to_string());
        }

        // Single-writer merge: partition in source order
        let mut matched: Vec<Song> = Vec::new();
        let mut errors: Vec<SongConversionError> = Vec::new();
        for song_match in matches.into_iter().flatten() {
            match song_match.matched_song {
                Some(target_song) => matched.push(target_song),
                None => errors.push(SongConversionError {
                    song_id: song_match.source_song.id.clone(),
                    song_title: song_match.source_song.title.clone(),
                    reason: format!("no match found on {}", client.catalog()),
                }),
            }
        }

        let matched_count = matched.len();
        let unmatched_count = errors.len();
        let total = matched_count + unmatched_count;
        let conversion_rate = if total > 0 {
            matched_count as f64 / total as f64
        } else {
            0.0
        };

        let mut external_playlist_id = None;
        if matched_count > 0 {
            let token = match client.get_access_token(user_id).await {
                Ok(Some(token)) => token,
                Ok(None) => {
                    return Err(ConversionError::NoCredential {
                        catalog: client.catalog(),
                    }
                    .to_string())
                }
                Err(e) => return Err(format!("credential lookup failed: {}", e)),
            };

            let description = format!(
                "Converted from {} playlist '{}'",
                playlist.catalog, playlist.name
            );
            let created = client
                .create_playlist(&token, &playlist.name, Some(&description))
                .await
                .map_err(|e| format!("target playlist creation failed: {}", e))?;

            let track_ids: Vec<String> = matched
                .iter()
                .map(|s| s.catalog_track_id.clone())
                .collect();
            for chunk in track_ids.chunks(self.settings.track_batch_size.max(1)) {
                client
                    .add_tracks(&token, &created, chunk)
                    .await
                    .map_err(|e| format!("adding tracks failed: {}", e))?;
            }

            info!(
                "Conversion {}: created external playlist {} with {} tracks",
                conversion_id, created, matched_count
            );
            external_playlist_id = Some(created);
        }

        Ok(ConversionOutcome {
            matched_count,
            unmatched_count,
            conversion_rate,
            external_playlist_id,
            errors,
        })
    }

    fn reload(&self, id: &str) -> Result<ConversionRecord, ConversionError> {
        self.conversions
            .get(id)?
            .ok_or_else(|| ConversionError::Store(anyhow::anyhow!("record {} disappeared", id)))
    }
}

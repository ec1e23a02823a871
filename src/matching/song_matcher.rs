//! Cross-catalog song matching.
//!
//! Drives the query planner against a catalog client, scores every returned
//! candidate with a weighted confidence function, and keeps the single best
//! candidate seen across all query variants.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::catalog::{CatalogClient, Song};

use super::query_planner;
use super::string_similarity::similarity;

/// Tunable weights and limits for the matcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatcherSettings {
    pub title_weight: f64,
    pub artist_weight: f64,
    pub duration_weight: f64,
    pub year_weight: f64,
    /// Candidates requested per query variant.
    pub max_results_per_query: usize,
    /// Timeout for one external search call, in seconds.
    pub search_timeout_secs: u64,
    /// Confidence above which a match is considered exact.
    pub exact_match_threshold: f64,
}

impl Default for MatcherSettings {
    fn default() -> Self {
        Self {
            title_weight: 0.4,
            artist_weight: 0.3,
            duration_weight: 0.2,
            year_weight: 0.1,
            max_results_per_query: 5,
            search_timeout_secs: 10,
            exact_match_threshold: 0.8,
        }
    }
}

/// Result of matching one source song against one target catalog.
///
/// A song with zero candidates across all queries yields
/// `matched_song: None, confidence: 0.0`, a normal outcome rather than an error.
#[derive(Debug, Clone, Serialize)]
pub struct SongMatch {
    pub source_song: Song,
    pub matched_song: Option<Song>,
    pub confidence: f64,
    pub is_exact_match: bool,
}

/// Stateless matcher; safe to invoke concurrently for many songs.
#[derive(Debug, Clone)]
pub struct SongMatcher {
    settings: MatcherSettings,
}

impl SongMatcher {
    pub fn new(settings: MatcherSettings) -> Self {
        Self { settings }
    }

    pub fn with_defaults() -> Self {
        Self::new(MatcherSettings::default())
    }

    /// Weighted confidence that `candidate` is the same recording as
    /// `source`, in [0, 1].
    ///
    /// Title and artist use edit-distance similarity over lowercased text;
    /// duration similarity is `max(0, 1 - |Δ| / source_duration)`. The year
    /// term is added only when both years are known, so confidence tops out
    /// at 1.0 - year_weight when either year is missing.
    pub fn candidate_confidence(&self, source: &Song, candidate: &Song) -> f64 {
        let title_sim = similarity(&source.title, &candidate.title);
        let artist_sim = similarity(&source.artist, &candidate.artist);

        let duration_sim = if source.duration_seconds > 0 {
            let delta =
                (source.duration_seconds as f64 - candidate.duration_seconds as f64).abs();
            (1.0 - delta / source.duration_seconds as f64).max(0.0)
        } else {
            0.0
        };

        let mut confidence = self.settings.title_weight * title_sim
            + self.settings.artist_weight * artist_sim
            + self.settings.duration_weight * duration_sim;

        if let (Some(source_year), Some(candidate_year)) =
            (source.release_year, candidate.release_year)
        {
            let year_sim = (1.0 - (source_year - candidate_year).abs() as f64 / 10.0).max(0.0);
            confidence += self.settings.year_weight * year_sim;
        }

        confidence.clamp(0.0, 1.0)
    }

    /// Match `source` against the catalog behind `client`.
    ///
    /// Every query variant is searched; results from all of them compete for
    /// the single best slot. A query that errors or times out is logged and
    /// skipped; it never aborts the overall match.
    pub async fn match_song(&self, source: &Song, client: &dyn CatalogClient) -> SongMatch {
        let search_timeout = Duration::from_secs(self.settings.search_timeout_secs);
        let queries = query_planner::plan(source);

        let mut best: Option<(Song, f64)> = None;

        for query in &queries {
            let candidates = match timeout(
                search_timeout,
                client.search(query, self.settings.max_results_per_query),
            )
            .await
            {
                Ok(Ok(candidates)) => candidates,
                Ok(Err(e)) => {
                    warn!(
                        "Search '{}' on {} failed, skipping: {}",
                        query,
                        client.catalog(),
                        e
                    );
                    continue;
                }
                Err(_) => {
                    warn!(
                        "Search '{}' on {} timed out after {:?}, skipping",
                        query,
                        client.catalog(),
                        search_timeout
                    );
                    continue;
                }
            };

            for candidate in candidates {
                let confidence = self.candidate_confidence(source, &candidate);
                let replace = match &best {
                    None => true,
                    // strictly greater: first-seen wins ties
                    Some((_, best_confidence)) => confidence > *best_confidence,
                };
                if replace {
                    best = Some((candidate, confidence));
                }
            }
        }

        let (matched_song, confidence) = match best {
            Some((song, confidence)) => {
                debug!(
                    "Matched '{}' by '{}' with confidence {:.3}",
                    source.title, source.artist, confidence
                );
                (Some(song), confidence)
            }
            None => {
                debug!(
                    "No candidates for '{}' by '{}' on {}",
                    source.title,
                    source.artist,
                    client.catalog()
                );
                (None, 0.0)
            }
        };

        SongMatch {
            source_song: source.clone(),
            is_exact_match: confidence > self.settings.exact_match_threshold,
            matched_song,
            confidence,
        }
    }
}

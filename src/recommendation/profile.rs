//! Listener taste profiles.
//!
//! A profile is derived from listening history and is always recomputable;
//! it has no lifecycle beyond "compute on demand".

use std::collections::HashMap;

use serde::Serialize;

use crate::catalog::{AudioFeatures, Song};

const MAX_FAVORITE_GENRES: usize = 5;
const MAX_FAVORITE_ARTISTS: usize = 10;

/// Aggregated taste signals for one listener.
#[derive(Debug, Clone, Serialize)]
pub struct UserMusicProfile {
    /// Frequency-ranked, at most five.
    pub favorite_genres: Vec<String>,
    /// Frequency-ranked, at most ten.
    pub favorite_artists: Vec<String>,
    pub average_duration_seconds: f64,
    pub preferred_tempo: f64,
    pub preferred_energy: f64,
    pub preferred_valence: f64,
    pub preferred_danceability: f64,
    /// Songs the profile was computed from.
    pub track_count: usize,
}

impl Default for UserMusicProfile {
    fn default() -> Self {
        Self {
            favorite_genres: Vec::new(),
            favorite_artists: Vec::new(),
            average_duration_seconds: 0.0,
            preferred_tempo: 120.0,
            preferred_energy: 0.5,
            preferred_valence: 0.5,
            preferred_danceability: 0.5,
            track_count: 0,
        }
    }
}

/// Count values case-insensitively, remembering the first-seen spelling,
/// then rank by frequency (ties alphabetical) and keep the top `limit`.
fn rank_by_frequency<'a, I>(values: I, limit: usize) -> Vec<String>
where
    I: Iterator<Item = &'a str>,
{
    let mut counts: HashMap<String, (usize, String)> = HashMap::new();
    for value in values {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        let entry = counts
            .entry(trimmed.to_lowercase())
            .or_insert((0, trimmed.to_string()));
        entry.0 += 1;
    }

    let mut ranked: Vec<(usize, String)> = counts.into_values().map(|(n, v)| (n, v)).collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    ranked.into_iter().take(limit).map(|(_, v)| v).collect()
}

impl UserMusicProfile {
    /// Derive a profile from a listening history.
    pub fn from_listening_history(songs: &[Song]) -> Self {
        if songs.is_empty() {
            return Self::default();
        }

        let favorite_genres = rank_by_frequency(
            songs.iter().filter_map(|s| s.genre.as_deref()),
            MAX_FAVORITE_GENRES,
        );
        let favorite_artists = rank_by_frequency(
            songs.iter().map(|s| s.artist.as_str()),
            MAX_FAVORITE_ARTISTS,
        );

        let average_duration_seconds = songs
            .iter()
            .map(|s| s.duration_seconds as f64)
            .sum::<f64>()
            / songs.len() as f64;

        let with_features: Vec<&AudioFeatures> =
            songs.iter().filter_map(|s| s.audio_features.as_ref()).collect();

        let defaults = Self::default();
        let (preferred_tempo, preferred_energy, preferred_valence, preferred_danceability) =
            if with_features.is_empty() {
                (
                    defaults.preferred_tempo,
                    defaults.preferred_energy,
                    defaults.preferred_valence,
                    defaults.preferred_danceability,
                )
            } else {
                let n = with_features.len() as f64;
                (
                    with_features.iter().map(|f| f.tempo_bpm).sum::<f64>() / n,
                    with_features.iter().map(|f| f.energy).sum::<f64>() / n,
                    with_features.iter().map(|f| f.valence).sum::<f64>() / n,
                    with_features.iter().map(|f| f.danceability).sum::<f64>() / n,
                )
            };

        Self {
            favorite_genres,
            favorite_artists,
            average_duration_seconds,
            preferred_tempo,
            preferred_energy,
            preferred_valence,
            preferred_danceability,
            track_count: songs.len(),
        }
    }

    /// The profile's preferred vector, usable with scored-mode similarity.
    pub fn preferred_features(&self) -> AudioFeatures {
        AudioFeatures {
            danceability: self.preferred_danceability,
            energy: self.preferred_energy,
            valence: self.preferred_valence,
            tempo_bpm: self.preferred_tempo,
            ..AudioFeatures::default()
        }
    }

    pub fn likes_genre(&self, genre: &str) -> bool {
        let genre = genre.to_lowercase();
        self.favorite_genres
            .iter()
            .any(|g| g.to_lowercase() == genre)
    }

    pub fn likes_artist(&self, artist: &str) -> bool {
        let artist = artist.to_lowercase();
        self.favorite_artists
            .iter()
            .any(|a| a.to_lowercase() == artist)
    }
}

//! Taste- and mood-driven recommendation scoring.
//!
//! Blends genre, artist and audio-feature signals into a single [0, 1]
//! score per candidate, each contribution tagged with a provenance reason,
//! then ranks with first-seen deduplication.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::Song;
use crate::matching::{scored_similarity, within_tolerance, FeatureTolerance};

use super::moods::MoodProfile;
use super::profile::UserMusicProfile;

/// Tunable bonuses and floors for the scorer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationSettings {
    /// Bonus when the candidate's genre is a favorite.
    pub genre_bonus: f64,
    /// Bonus when the candidate's artist is a favorite.
    pub artist_bonus: f64,
    /// Weight of the audio-feature similarity contribution.
    pub audio_weight: f64,
    /// Candidates below this final score never reach the ranked output.
    pub min_score: f64,
    /// Candidates whose audio similarity is at or below this are discarded.
    pub audio_floor: f64,
    /// Bonus when the candidate's genre belongs to the seeded mood.
    pub mood_genre_bonus: f64,
    /// Bonus when tempo and energy both sit inside the mood's ranges.
    pub mood_fit_bonus: f64,
    /// Tolerances for the characteristic-match fallback when the genre tag
    /// itself doesn't line up.
    pub tolerance: FeatureTolerance,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            genre_bonus: 0.35,
            artist_bonus: 0.3,
            audio_weight: 0.35,
            min_score: 0.2,
            audio_floor: 0.3,
            mood_genre_bonus: 0.25,
            mood_fit_bonus: 0.15,
            tolerance: FeatureTolerance::default(),
        }
    }
}

/// A ranked recommendation.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendedSong {
    pub song: Song,
    /// Final blended score in [0, 1].
    pub score: f64,
    /// Provenance of each contribution.
    pub reasons: Vec<String>,
}

/// Stateless scorer over a candidate pool.
pub struct RecommendationScorer {
    settings: RecommendationSettings,
}

impl RecommendationScorer {
    pub fn new(settings: RecommendationSettings) -> Self {
        Self { settings }
    }

    pub fn with_defaults() -> Self {
        Self::new(RecommendationSettings::default())
    }

    /// Score one candidate against a profile.
    ///
    /// The genre bonus is granted on a matching genre tag, or failing that
    /// on a characteristic match: the candidate's features sitting within
    /// tolerance of the profile's preferred vector. A candidate without
    /// audio features keeps its genre/artist contributions; only the audio
    /// term is omitted.
    pub fn score(&self, candidate: &Song, profile: &UserMusicProfile) -> (f64, Vec<String>) {
        let mut score = 0.0;
        let mut reasons = Vec::new();

        let genre_tag_match = candidate
            .genre
            .as_ref()
            .map(|g| profile.likes_genre(g))
            .unwrap_or(false);
        if genre_tag_match {
            score += self.settings.genre_bonus;
            reasons.push(format!(
                "matches favorite genre '{}'",
                candidate.genre.as_deref().unwrap_or_default()
            ));
        } else {
            let preferred = profile.preferred_features();
            if within_tolerance(
                Some(&preferred),
                candidate.audio_features.as_ref(),
                &self.settings.tolerance,
            ) {
                score += self.settings.genre_bonus;
                reasons.push("audio character matches your listening".to_string());
            }
        }

        if profile.likes_artist(&candidate.artist) {
            score += self.settings.artist_bonus;
            reasons.push(format!("by favorite artist '{}'", candidate.artist));
        }

        if let Some(features) = &candidate.audio_features {
            let audio = scored_similarity(&profile.preferred_features(), features);
            score += self.settings.audio_weight * audio;
            reasons.push(format!("audio profile similarity {:.2}", audio));
        }

        (score.clamp(0.0, 1.0), reasons)
    }

    /// Rank candidates against a profile: dedup by lowercased
    /// (title, artist) keeping the first occurrence, drop sub-floor scores,
    /// sort descending, truncate to `limit`.
    pub fn rank(
        &self,
        candidates: &[Song],
        profile: &UserMusicProfile,
        limit: usize,
    ) -> Vec<RecommendedSong> {
        self.rank_with(candidates, limit, |candidate| {
            if let Some(features) = &candidate.audio_features {
                let audio = scored_similarity(&profile.preferred_features(), features);
                if audio <= self.settings.audio_floor {
                    return None;
                }
            }
            Some(self.score(candidate, profile))
        })
    }

    /// Rank candidates for a mood, optionally merging profile bonuses.
    ///
    /// Candidates start from the mood's base score instead of zero, then
    /// collect mood-genre and tempo/energy-fit bonuses, plus the profile's
    /// genre and artist bonuses when a profile is supplied.
    pub fn rank_for_mood(
        &self,
        mood: &MoodProfile,
        candidates: &[Song],
        profile: Option<&UserMusicProfile>,
        limit: usize,
    ) -> Vec<RecommendedSong> {
        self.rank_with(candidates, limit, |candidate| {
            let mut score = mood.base_score;
            let mut reasons = vec![format!("seeded from mood '{}'", mood.name)];

            if let Some(genre) = &candidate.genre {
                if mood.includes_genre(genre) {
                    score += self.settings.mood_genre_bonus;
                    reasons.push(format!("genre '{}' fits the mood", genre));
                }
            }

            if let Some(features) = &candidate.audio_features {
                if mood.tempo_fits(features.tempo_bpm) && mood.energy_fits(features.energy) {
                    score += self.settings.mood_fit_bonus;
                    reasons.push(format!(
                        "tempo {:.0} bpm and energy {:.2} fit the mood",
                        features.tempo_bpm, features.energy
                    ));
                }
            }

            if let Some(profile) = profile {
                if let Some(genre) = &candidate.genre {
                    if profile.likes_genre(genre) {
                        score += self.settings.genre_bonus;
                        reasons.push(format!("matches favorite genre '{}'", genre));
                    }
                }
                if profile.likes_artist(&candidate.artist) {
                    score += self.settings.artist_bonus;
                    reasons.push(format!("by favorite artist '{}'", candidate.artist));
                }
            }

            Some((score.clamp(0.0, 1.0), reasons))
        })
    }

    /// Shared dedup + floor + sort + truncate pipeline. `score_fn` returns
    /// None to discard a candidate outright.
    fn rank_with<F>(&self, candidates: &[Song], limit: usize, score_fn: F) -> Vec<RecommendedSong>
    where
        F: Fn(&Song) -> Option<(f64, Vec<String>)>,
    {
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut ranked: Vec<RecommendedSong> = Vec::new();

        for candidate in candidates {
            let key = (
                candidate.title.to_lowercase(),
                candidate.artist.to_lowercase(),
            );
            if !seen.insert(key) {
                continue; // first occurrence wins
            }

            let Some((score, reasons)) = score_fn(candidate) else {
                continue;
            };
            if score < self.settings.min_score {
                continue;
            }

            ranked.push(RecommendedSong {
                song: candidate.clone(),
                score,
                reasons,
            });
        }

        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(limit);

        debug!("Ranked {} of {} candidates", ranked.len(), candidates.len());
        ranked
    }
}

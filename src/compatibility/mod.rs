//! Pre-flight playlist/catalog compatibility estimation.
//!
//! Estimates, from aggregate playlist metadata alone, how well a playlist is
//! likely to convert to a target catalog. No per-song external calls; this
//! must be cheap enough to run before committing to a full conversion. The
//! penalty table is configuration, not business truth; defaults below are
//! one workable heuristic.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{Catalog, Song};

/// Advisory report for one (playlist, target catalog) pair.
#[derive(Debug, Clone, Serialize)]
pub struct CompatibilityReport {
    /// Clamped to [0, 1].
    pub score: f64,
    /// `floor(song_count * score)`.
    pub estimated_match_count: usize,
    /// One human-readable line per triggered risk signal.
    pub issues: Vec<String>,
}

/// Tunable penalty table.
///
/// Every signal subtracts its penalty from a starting score of 1.0 and
/// appends an issue line. All values are replaceable via configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompatibilityRules {
    /// Conversions scoring below this are rejected before any song lookups.
    pub min_score: f64,
    /// Penalty per denylisted genre keyword found in the playlist.
    pub genre_penalty: f64,
    /// Average release year below 1990.
    pub pre_1990_penalty: f64,
    /// Additional penalty when the average release year is below 1970.
    pub pre_1970_penalty: f64,
    /// Average duration above `long_track_secs`.
    pub long_track_secs: f64,
    pub long_track_penalty: f64,
    /// Additional penalty above `very_long_track_secs`.
    pub very_long_track_secs: f64,
    pub very_long_track_penalty: f64,
    /// A single genre covering at least this share of the playlist.
    pub dominant_genre_share: f64,
    pub dominant_genre_penalty: f64,
    /// Per-catalog genre keywords with weak coverage on that catalog.
    pub genre_denylists: HashMap<Catalog, Vec<String>>,
}

impl Default for CompatibilityRules {
    fn default() -> Self {
        let mut genre_denylists = HashMap::new();
        genre_denylists.insert(
            Catalog::Youtube,
            vec![
                "classical".to_string(),
                "opera".to_string(),
                "spoken word".to_string(),
            ],
        );
        genre_denylists.insert(
            Catalog::Deezer,
            vec!["audiobook".to_string(), "podcast".to_string()],
        );

        Self {
            min_score: 0.3,
            genre_penalty: 0.2,
            pre_1990_penalty: 0.2,
            pre_1970_penalty: 0.2,
            long_track_secs: 480.0,
            long_track_penalty: 0.1,
            very_long_track_secs: 600.0,
            very_long_track_penalty: 0.1,
            dominant_genre_share: 0.8,
            dominant_genre_penalty: 0.1,
            genre_denylists,
        }
    }
}

/// Heuristic pre-flight gate for conversions.
pub struct CompatibilityAnalyzer {
    rules: CompatibilityRules,
}

impl CompatibilityAnalyzer {
    pub fn new(rules: CompatibilityRules) -> Self {
        Self { rules }
    }

    pub fn with_defaults() -> Self {
        Self::new(CompatibilityRules::default())
    }

    pub fn rules(&self) -> &CompatibilityRules {
        &self.rules
    }

    /// Estimate how well `songs` will convert to `target`.
    pub fn analyze(&self, songs: &[Song], target: Catalog) -> CompatibilityReport {
        let mut score = 1.0f64;
        let mut issues = Vec::new();

        if songs.is_empty() {
            return CompatibilityReport {
                score,
                estimated_match_count: 0,
                issues,
            };
        }

        let genres: Vec<String> = songs
            .iter()
            .filter_map(|s| s.genre.as_ref())
            .map(|g| g.to_lowercase())
            .collect();

        if let Some(denylist) = self.rules.genre_denylists.get(&target) {
            for keyword in denylist {
                let keyword = keyword.to_lowercase();
                if genres.iter().any(|g| g.contains(&keyword)) {
                    score -= self.rules.genre_penalty;
                    issues.push(format!(
                        "genre '{}' has weak coverage on {}",
                        keyword, target
                    ));
                }
            }
        }

        let known_years: Vec<i32> = songs.iter().filter_map(|s| s.release_year).collect();
        if !known_years.is_empty() {
            let average_year =
                known_years.iter().map(|y| *y as f64).sum::<f64>() / known_years.len() as f64;
            if average_year < 1990.0 {
                score -= self.rules.pre_1990_penalty;
                issues.push(format!(
                    "average release year {:.0} predates 1990; older releases are often missing",
                    average_year
                ));
            }
            if average_year < 1970.0 {
                score -= self.rules.pre_1970_penalty;
                issues.push(format!(
                    "average release year {:.0} predates 1970; pre-1970 recordings are frequently unavailable",
                    average_year
                ));
            }
        }

        let average_duration = songs
            .iter()
            .map(|s| s.duration_seconds as f64)
            .sum::<f64>()
            / songs.len() as f64;
        if average_duration > self.rules.long_track_secs {
            score -= self.rules.long_track_penalty;
            issues.push(format!(
                "average track length {:.0}s exceeds {:.0}s",
                average_duration, self.rules.long_track_secs
            ));
        }
        if average_duration > self.rules.very_long_track_secs {
            score -= self.rules.very_long_track_penalty;
            issues.push(format!(
                "average track length {:.0}s exceeds {:.0}s; extended tracks match poorly",
                average_duration, self.rules.very_long_track_secs
            ));
        }

        if !genres.is_empty() {
            let mut counts: HashMap<&str, usize> = HashMap::new();
            for genre in &genres {
                *counts.entry(genre.as_str()).or_default() += 1;
            }
            if let Some((genre, count)) = counts.into_iter().max_by_key(|(_, count)| *count) {
                let share = count as f64 / songs.len() as f64;
                if share >= self.rules.dominant_genre_share {
                    score -= self.rules.dominant_genre_penalty;
                    issues.push(format!(
                        "genre '{}' makes up {:.0}% of the playlist; single-genre playlists convert unevenly",
                        genre,
                        share * 100.0
                    ));
                }
            }
        }

        let score = score.clamp(0.0, 1.0);
        let estimated_match_count = (songs.len() as f64 * score).floor() as usize;

        debug!(
            "Compatibility for {} songs -> {}: {:.2} ({} issues)",
            songs.len(),
            target,
            score,
            issues.len()
        );

        CompatibilityReport {
            score,
            estimated_match_count,
            issues,
        }
    }
}

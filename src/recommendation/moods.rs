//! Mood catalog for mood-seeded recommendations.
//!
//! An immutable lookup table mapping each mood to the genres and
//! tempo/energy ranges that characterize it, plus the base score a
//! candidate starts from when recommended for that mood.

use std::collections::HashMap;

use lazy_static::lazy_static;
use serde::Serialize;

/// Characterization of one mood.
#[derive(Debug, Clone, Serialize)]
pub struct MoodProfile {
    pub name: &'static str,
    pub genres: &'static [&'static str],
    /// Inclusive BPM range.
    pub tempo_range: (f64, f64),
    /// Inclusive energy range.
    pub energy_range: (f64, f64),
    /// Score a candidate starts from before bonuses.
    pub base_score: f64,
}

impl MoodProfile {
    pub fn includes_genre(&self, genre: &str) -> bool {
        let genre = genre.to_lowercase();
        self.genres.iter().any(|g| genre.contains(g))
    }

    pub fn tempo_fits(&self, tempo_bpm: f64) -> bool {
        tempo_bpm >= self.tempo_range.0 && tempo_bpm <= self.tempo_range.1
    }

    pub fn energy_fits(&self, energy: f64) -> bool {
        energy >= self.energy_range.0 && energy <= self.energy_range.1
    }
}

lazy_static! {
    static ref MOOD_CATALOG: HashMap<&'static str, MoodProfile> = {
        let moods = [
            MoodProfile {
                name: "chill",
                genres: &["lo-fi", "ambient", "acoustic", "jazz"],
                tempo_range: (60.0, 105.0),
                energy_range: (0.0, 0.5),
                base_score: 0.3,
            },
            MoodProfile {
                name: "energetic",
                genres: &["rock", "electronic", "drum and bass", "punk"],
                tempo_range: (125.0, 200.0),
                energy_range: (0.7, 1.0),
                base_score: 0.3,
            },
            MoodProfile {
                name: "happy",
                genres: &["pop", "funk", "disco", "ska"],
                tempo_range: (100.0, 140.0),
                energy_range: (0.5, 0.9),
                base_score: 0.3,
            },
            MoodProfile {
                name: "melancholy",
                genres: &["indie", "folk", "blues", "singer-songwriter"],
                tempo_range: (55.0, 100.0),
                energy_range: (0.0, 0.45),
                base_score: 0.25,
            },
            MoodProfile {
                name: "focus",
                genres: &["ambient", "classical", "minimal", "instrumental"],
                tempo_range: (50.0, 110.0),
                energy_range: (0.0, 0.4),
                base_score: 0.25,
            },
            MoodProfile {
                name: "party",
                genres: &["dance", "house", "hip hop", "reggaeton"],
                tempo_range: (110.0, 135.0),
                energy_range: (0.65, 1.0),
                base_score: 0.3,
            },
        ];
        moods.into_iter().map(|m| (m.name, m)).collect()
    };
}

/// Look up a mood by name, case-insensitively.
pub fn mood_profile(name: &str) -> Option<&'static MoodProfile> {
    MOOD_CATALOG.get(name.to_lowercase().as_str())
}

/// All known mood names, sorted.
pub fn mood_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = MOOD_CATALOG.keys().copied().collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_case_insensitive() {
        assert!(mood_profile("chill").is_some());
        assert!(mood_profile("Chill").is_some());
        assert!(mood_profile("CHILL").is_some());
        assert!(mood_profile("vaporwave").is_none());
    }

    #[test]
    fn test_mood_names_sorted() {
        let names = mood_names();
        assert_eq!(names.len(), 6);
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_genre_match_is_substring() {
        let chill = mood_profile("chill").unwrap();
        assert!(chill.includes_genre("Acoustic Folk"));
        assert!(chill.includes_genre("jazz"));
        assert!(!chill.includes_genre("metal"));
    }

    #[test]
    fn test_ranges_inclusive() {
        let party = mood_profile("party").unwrap();
        assert!(party.tempo_fits(110.0));
        assert!(party.tempo_fits(135.0));
        assert!(!party.tempo_fits(136.0));
        assert!(party.energy_fits(0.65));
        assert!(!party.energy_fits(0.6));
    }
}

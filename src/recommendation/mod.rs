//! Recommendation engine: listener profiles, mood catalog and scoring.

mod moods;
mod profile;
mod scorer;

pub use moods::{mood_names, mood_profile, MoodProfile};
pub use profile::UserMusicProfile;
pub use scorer::{RecommendationScorer, RecommendationSettings, RecommendedSong};

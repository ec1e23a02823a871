//! The cross-catalog song matching engine.

pub mod audio_features;
pub mod query_planner;
pub mod song_matcher;
pub mod string_similarity;

pub use audio_features::{scored_similarity, within_tolerance, FeatureTolerance};
pub use song_matcher::{MatcherSettings, SongMatch, SongMatcher};
pub use string_similarity::{levenshtein_distance, similarity};

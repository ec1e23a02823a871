use std::sync::Arc;
use std::time::Instant;

use crate::compatibility::CompatibilityAnalyzer;
use crate::conversion::{ConversionOrchestrator, ConversionStore};
use crate::playlists::PlaylistStore;
use crate::recommendation::RecommendationScorer;

pub type GuardedConversionStore = Arc<dyn ConversionStore>;
pub type GuardedPlaylistStore = Arc<dyn PlaylistStore>;

/// Shared state for all request handlers.
#[derive(Clone)]
pub struct ServerState {
    pub start_time: Instant,
    pub hash: String,
    pub orchestrator: Arc<ConversionOrchestrator>,
    pub conversions: GuardedConversionStore,
    pub playlists: GuardedPlaylistStore,
    pub analyzer: Arc<CompatibilityAnalyzer>,
    pub scorer: Arc<RecommendationScorer>,
}

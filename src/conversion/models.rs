//! Data models for playlist conversions.

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;

/// Status of a conversion record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversionStatus {
    Pending,
    Processing,
    Completed, // terminal
    Failed,    // terminal
}

impl ConversionStatus {
    /// Returns true if this is a terminal state (Completed or Failed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConversionStatus::Completed | ConversionStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionStatus::Pending => "PENDING",
            ConversionStatus::Processing => "PROCESSING",
            ConversionStatus::Completed => "COMPLETED",
            ConversionStatus::Failed => "FAILED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(ConversionStatus::Pending),
            "PROCESSING" => Some(ConversionStatus::Processing),
            "COMPLETED" => Some(ConversionStatus::Completed),
            "FAILED" => Some(ConversionStatus::Failed),
            _ => None,
        }
    }
}

/// One unmatched song within a conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongConversionError {
    pub song_id: String,
    pub song_title: String,
    pub reason: String,
}

/// Persistent record of one conversion attempt.
///
/// At most one non-failed record may exist per (source playlist, target
/// catalog); the store enforces this atomically on insert. Only the
/// orchestrator mutates a record after creation.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionRecord {
    pub id: String,
    pub source_playlist_id: String,
    pub target_catalog: Catalog,
    pub status: ConversionStatus,
    pub matched_count: usize,
    pub unmatched_count: usize,
    /// matched / total, in [0, 1]; 0 for an empty playlist.
    pub conversion_rate: f64,
    /// One entry per unmatched song.
    pub errors: Vec<SongConversionError>,
    /// Top-level failure reason when status is Failed.
    pub failure: Option<String>,
    /// ID of the playlist created on the target catalog, when one was made.
    pub external_playlist_id: Option<String>,
    pub requested_by_user_id: Option<String>,
    /// Unix timestamps.
    pub created_at: i64,
    pub completed_at: Option<i64>,
}

impl ConversionRecord {
    /// Create a new pending record.
    pub fn new(
        id: String,
        source_playlist_id: impl Into<String>,
        target_catalog: Catalog,
    ) -> Self {
        Self {
            id,
            source_playlist_id: source_playlist_id.into(),
            target_catalog,
            status: ConversionStatus::Pending,
            matched_count: 0,
            unmatched_count: 0,
            conversion_rate: 0.0,
            errors: Vec::new(),
            failure: None,
            external_playlist_id: None,
            requested_by_user_id: None,
            created_at: chrono::Utc::now().timestamp(),
            completed_at: None,
        }
    }

    /// Set the user who requested this conversion.
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.requested_by_user_id = Some(user_id.into());
        self
    }

    pub fn total_songs(&self) -> usize {
        self.matched_count + self.unmatched_count
    }
}

/// Successful-outcome payload persisted when a conversion completes.
#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    pub matched_count: usize,
    pub unmatched_count: usize,
    pub conversion_rate: f64,
    pub external_playlist_id: Option<String>,
    pub errors: Vec<SongConversionError>,
}

/// Aggregate statistics over all conversion records.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionStats {
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    /// Mean conversion rate over completed records, 0.0 when none exist.
    pub average_conversion_rate: f64,
}

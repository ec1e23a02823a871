use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_dir: Option<String>,
    pub port: Option<u16>,
    pub logging_level: Option<String>,

    // Feature configs
    pub matcher: Option<MatcherConfig>,
    pub compatibility: Option<CompatibilityConfig>,
    pub conversion: Option<ConversionConfig>,
    pub recommendation: Option<RecommendationConfig>,

    /// One entry per external catalog bridge.
    pub catalogs: Vec<CatalogEndpointConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct MatcherConfig {
    pub title_weight: Option<f64>,
    pub artist_weight: Option<f64>,
    pub duration_weight: Option<f64>,
    pub year_weight: Option<f64>,
    pub max_results_per_query: Option<usize>,
    pub search_timeout_secs: Option<u64>,
    pub exact_match_threshold: Option<f64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct CompatibilityConfig {
    pub min_score: Option<f64>,
    pub genre_penalty: Option<f64>,
    pub pre_1990_penalty: Option<f64>,
    pub pre_1970_penalty: Option<f64>,
    pub long_track_penalty: Option<f64>,
    pub very_long_track_penalty: Option<f64>,
    pub dominant_genre_penalty: Option<f64>,
    /// Catalog name (e.g. "YOUTUBE") to denylisted genre keywords.
    pub genre_denylists: Option<std::collections::HashMap<String, Vec<String>>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ConversionConfig {
    pub worker_count: Option<usize>,
    pub track_batch_size: Option<usize>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RecommendationConfig {
    pub genre_bonus: Option<f64>,
    pub artist_bonus: Option<f64>,
    pub audio_weight: Option<f64>,
    pub min_score: Option<f64>,
    pub audio_floor: Option<f64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogEndpointConfig {
    /// Catalog name, e.g. "SPOTIFY".
    pub catalog: String,
    /// Base URL of the platform bridge service.
    pub base_url: String,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

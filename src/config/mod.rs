mod file_config;

pub use file_config::{
    CatalogEndpointConfig, CompatibilityConfig, ConversionConfig, FileConfig, MatcherConfig,
    RecommendationConfig,
};

use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::catalog::Catalog;
use crate::compatibility::CompatibilityRules;
use crate::conversion::ConversionSettings;
use crate::matching::MatcherSettings;
use crate::recommendation::RecommendationSettings;

/// CLI arguments that participate in config resolution. TOML values
/// override these where present.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
}

/// A resolved catalog bridge endpoint.
#[derive(Debug, Clone)]
pub struct CatalogEndpoint {
    pub catalog: Catalog,
    pub base_url: String,
    pub timeout_secs: u64,
}

/// Fully resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub port: u16,

    pub matcher: MatcherSettings,
    pub compatibility: CompatibilityRules,
    pub conversion: ConversionSettings,
    pub recommendation: RecommendationSettings,

    pub catalogs: Vec<CatalogEndpoint>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file
    /// config. TOML values override CLI values where present; everything
    /// else falls back to the per-module defaults.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);

        let matcher_file = file.matcher.unwrap_or_default();
        let defaults = MatcherSettings::default();
        let matcher = MatcherSettings {
            title_weight: matcher_file.title_weight.unwrap_or(defaults.title_weight),
            artist_weight: matcher_file
                .artist_weight
                .unwrap_or(defaults.artist_weight),
            duration_weight: matcher_file
                .duration_weight
                .unwrap_or(defaults.duration_weight),
            year_weight: matcher_file.year_weight.unwrap_or(defaults.year_weight),
            max_results_per_query: matcher_file
                .max_results_per_query
                .unwrap_or(defaults.max_results_per_query),
            search_timeout_secs: matcher_file
                .search_timeout_secs
                .unwrap_or(defaults.search_timeout_secs),
            exact_match_threshold: matcher_file
                .exact_match_threshold
                .unwrap_or(defaults.exact_match_threshold),
        };

        let compat_file = file.compatibility.unwrap_or_default();
        let mut compatibility = CompatibilityRules::default();
        if let Some(v) = compat_file.min_score {
            compatibility.min_score = v;
        }
        if let Some(v) = compat_file.genre_penalty {
            compatibility.genre_penalty = v;
        }
        if let Some(v) = compat_file.pre_1990_penalty {
            compatibility.pre_1990_penalty = v;
        }
        if let Some(v) = compat_file.pre_1970_penalty {
            compatibility.pre_1970_penalty = v;
        }
        if let Some(v) = compat_file.long_track_penalty {
            compatibility.long_track_penalty = v;
        }
        if let Some(v) = compat_file.very_long_track_penalty {
            compatibility.very_long_track_penalty = v;
        }
        if let Some(v) = compat_file.dominant_genre_penalty {
            compatibility.dominant_genre_penalty = v;
        }
        if let Some(denylists) = compat_file.genre_denylists {
            compatibility.genre_denylists.clear();
            for (name, keywords) in denylists {
                let catalog = Catalog::from_str(&name)
                    .ok_or_else(|| anyhow::anyhow!("Unknown catalog in denylist: {}", name))?;
                compatibility.genre_denylists.insert(catalog, keywords);
            }
        }

        let conversion_file = file.conversion.unwrap_or_default();
        let defaults = ConversionSettings::default();
        let conversion = ConversionSettings {
            worker_count: conversion_file
                .worker_count
                .unwrap_or(defaults.worker_count),
            track_batch_size: conversion_file
                .track_batch_size
                .unwrap_or(defaults.track_batch_size),
        };

        let rec_file = file.recommendation.unwrap_or_default();
        let defaults = RecommendationSettings::default();
        let recommendation = RecommendationSettings {
            genre_bonus: rec_file.genre_bonus.unwrap_or(defaults.genre_bonus),
            artist_bonus: rec_file.artist_bonus.unwrap_or(defaults.artist_bonus),
            audio_weight: rec_file.audio_weight.unwrap_or(defaults.audio_weight),
            min_score: rec_file.min_score.unwrap_or(defaults.min_score),
            audio_floor: rec_file.audio_floor.unwrap_or(defaults.audio_floor),
            ..defaults
        };

        let mut catalogs = Vec::with_capacity(file.catalogs.len());
        for endpoint in &file.catalogs {
            let catalog = Catalog::from_str(&endpoint.catalog).ok_or_else(|| {
                anyhow::anyhow!("Unknown catalog in config: {}", endpoint.catalog)
            })?;
            catalogs.push(CatalogEndpoint {
                catalog,
                base_url: endpoint.base_url.clone(),
                timeout_secs: endpoint.timeout_secs.unwrap_or(10),
            });
        }

        Ok(Self {
            db_dir,
            port,
            matcher,
            compatibility,
            conversion,
            recommendation,
            catalogs,
        })
    }
}

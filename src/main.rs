use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crosstune::catalog::{CatalogClientRegistry, HttpCatalogClient};
use crosstune::compatibility::CompatibilityAnalyzer;
use crosstune::config::{AppConfig, CliConfig, FileConfig};
use crosstune::conversion::{ConversionOrchestrator, SqliteConversionStore};
use crosstune::matching::SongMatcher;
use crosstune::playlists::SqlitePlaylistStore;
use crosstune::recommendation::RecommendationScorer;
use crosstune::server::{run_server, ServerState};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding the SQLite databases.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Port to listen on.
    #[clap(long, default_value_t = 3030)]
    pub port: u16,

    /// Path to a TOML config file; its values override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    let file_config = match &args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let cli_config = CliConfig {
        db_dir: args.db_dir.clone(),
        port: args.port,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    let hash = env!("GIT_HASH").to_string();
    info!("Starting crosstune-server ({})", hash);

    let conversions = Arc::new(SqliteConversionStore::new(
        config.db_dir.join("conversions.db"),
    )?);
    let playlists = Arc::new(SqlitePlaylistStore::new(config.db_dir.join("library.db"))?);

    let mut registry = CatalogClientRegistry::new();
    for endpoint in &config.catalogs {
        info!(
            "Registering {} bridge at {}",
            endpoint.catalog, endpoint.base_url
        );
        registry.register(Arc::new(HttpCatalogClient::new(
            endpoint.catalog,
            endpoint.base_url.clone(),
            endpoint.timeout_secs,
        )));
    }
    if registry.is_empty() {
        info!("No catalog bridges configured; conversions will be rejected");
    }

    let analyzer = CompatibilityAnalyzer::new(config.compatibility.clone());
    let orchestrator = Arc::new(ConversionOrchestrator::new(
        conversions.clone(),
        playlists.clone(),
        Arc::new(registry),
        SongMatcher::new(config.matcher.clone()),
        analyzer,
        config.conversion.clone(),
    ));

    let state = ServerState {
        start_time: Instant::now(),
        hash,
        orchestrator,
        conversions,
        playlists,
        analyzer: Arc::new(CompatibilityAnalyzer::new(config.compatibility.clone())),
        scorer: Arc::new(RecommendationScorer::new(config.recommendation.clone())),
    };

    run_server(state, config.port).await
}

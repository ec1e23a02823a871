use std::time::Duration;

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::catalog::Catalog;
use crate::conversion::{ConversionError, ConversionRecord, ConversionStats};
use crate::recommendation::{mood_names, mood_profile, RecommendedSong, UserMusicProfile};

use super::state::ServerState;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

fn conversion_error_response(error: ConversionError) -> Response {
    let status = match &error {
        ConversionError::DuplicateConversion { .. } => StatusCode::CONFLICT,
        ConversionError::PlaylistNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, error.to_string())
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    Json(ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    })
}

#[derive(Deserialize, Debug)]
struct StartConversionBody {
    pub playlist_id: String,
    pub target_catalog: Catalog,
    pub user_id: String,
}

async fn start_conversion(
    State(state): State<ServerState>,
    Json(body): Json<StartConversionBody>,
) -> Response {
    match state
        .orchestrator
        .convert(&body.playlist_id, body.target_catalog, &body.user_id)
        .await
    {
        Ok(record) => Json(record).into_response(),
        Err(e) => conversion_error_response(e),
    }
}

async fn get_conversion(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Response {
    match state.conversions.get(&id) {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, format!("no conversion {}", id)),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

#[derive(Serialize)]
struct CancelResponse {
    cancelled: bool,
}

async fn cancel_conversion(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let cancelled = state.orchestrator.cancel(&id);
    Json(CancelResponse { cancelled })
}

async fn conversion_stats(State(state): State<ServerState>) -> Response {
    match state.conversions.stats() {
        Ok(stats) => Json::<ConversionStats>(stats).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn playlist_conversions(
    State(state): State<ServerState>,
    Path(playlist_id): Path<String>,
) -> Response {
    match state.conversions.list_for_playlist(&playlist_id) {
        Ok(records) => Json::<Vec<ConversionRecord>>(records).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

#[derive(Deserialize, Debug)]
struct CompatibilityBody {
    pub playlist_id: String,
    pub target_catalog: Catalog,
}

async fn check_compatibility(
    State(state): State<ServerState>,
    Json(body): Json<CompatibilityBody>,
) -> Response {
    match state.playlists.get_playlist(&body.playlist_id) {
        Ok(Some(_)) => {}
        Ok(None) => {
            return error_response(
                StatusCode::NOT_FOUND,
                format!("no playlist {}", body.playlist_id),
            )
        }
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }

    match state.playlists.load_playlist_songs(&body.playlist_id) {
        Ok(songs) => {
            let report = state.analyzer.analyze(&songs, body.target_catalog);
            Json(report).into_response()
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

fn default_limit() -> usize {
    25
}

#[derive(Deserialize, Debug)]
struct RecommendationsBody {
    /// Playlist used as listening history for the profile.
    pub history_playlist_id: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

async fn recommendations(
    State(state): State<ServerState>,
    Json(body): Json<RecommendationsBody>,
) -> Response {
    let history = match state.playlists.load_playlist_songs(&body.history_playlist_id) {
        Ok(songs) => songs,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    let profile = UserMusicProfile::from_listening_history(&history);

    match state.playlists.all_songs() {
        Ok(pool) => {
            let ranked = state.scorer.rank(&pool, &profile, body.limit);
            Json::<Vec<RecommendedSong>>(ranked).into_response()
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

#[derive(Deserialize, Debug)]
struct MoodRecommendationsBody {
    pub mood: String,
    /// Optional listening history to merge taste bonuses from.
    pub history_playlist_id: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

async fn mood_recommendations(
    State(state): State<ServerState>,
    Json(body): Json<MoodRecommendationsBody>,
) -> Response {
    let Some(mood) = mood_profile(&body.mood) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!(
                "unknown mood '{}' (known: {})",
                body.mood,
                mood_names().join(", ")
            ),
        );
    };

    let profile = match &body.history_playlist_id {
        Some(id) => match state.playlists.load_playlist_songs(id) {
            Ok(songs) => Some(UserMusicProfile::from_listening_history(&songs)),
            Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        },
        None => None,
    };

    match state.playlists.all_songs() {
        Ok(pool) => {
            let ranked = state
                .scorer
                .rank_for_mood(mood, &pool, profile.as_ref(), body.limit);
            Json::<Vec<RecommendedSong>>(ranked).into_response()
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// Build the application router.
pub fn make_app(state: ServerState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/v1/conversions", post(start_conversion))
        .route("/v1/conversions/stats", get(conversion_stats))
        .route("/v1/conversions/{id}", get(get_conversion))
        .route("/v1/conversions/{id}/cancel", post(cancel_conversion))
        .route("/v1/playlists/{id}/conversions", get(playlist_conversions))
        .route("/v1/compatibility", post(check_compatibility))
        .route("/v1/recommendations", post(recommendations))
        .route("/v1/recommendations/mood", post(mood_recommendations))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn run_server(state: ServerState, port: u16) -> Result<()> {
    let app = make_app(state);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    info!("Listening on 127.0.0.1:{}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;
    Ok(())
}

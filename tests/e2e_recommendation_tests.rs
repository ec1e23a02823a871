//! End-to-end tests for profile-driven and mood-driven recommendations
//! over the playlist store.

mod common;

use common::TestHarness;
use crosstune::catalog::{AudioFeatures, Catalog, Song};
use crosstune::playlists::PlaylistStore;
use crosstune::recommendation::{
    mood_profile, RecommendationScorer, UserMusicProfile,
};

fn library_song(id: &str, title: &str, artist: &str, genre: &str, tempo: f64, energy: f64) -> Song {
    Song::new(id, title, artist, 210, Catalog::Spotify, format!("sp-{}", id))
        .with_genre(genre)
        .with_audio_features(AudioFeatures {
            tempo_bpm: tempo,
            energy,
            ..AudioFeatures::default()
        })
}

fn seed_library(harness: &TestHarness) -> Vec<Song> {
    let songs = vec![
        library_song("l1", "Night Drive", "Neon Club", "house", 124.0, 0.85),
        library_song("l2", "Cedar Porch", "Quiet Pines", "folk", 78.0, 0.25),
        library_song("l3", "Circuit Break", "Neon Club", "electronic", 140.0, 0.9),
        library_song("l4", "Slow Orbit", "Quiet Pines", "ambient", 65.0, 0.15),
        library_song("l5", "Gold Rush", "Brass Alley", "funk", 112.0, 0.7),
    ];
    for song in &songs {
        harness.playlists.upsert_song(song).unwrap();
    }
    songs
}

// ============================================================================
// Profile-driven ranking
// ============================================================================

#[test]
fn test_profile_from_stored_history_drives_ranking() {
    let harness = TestHarness::new();
    seed_library(&harness);

    // History: two Neon Club dance tracks
    let history = vec![
        library_song("h1", "Warehouse", "Neon Club", "house", 126.0, 0.8),
        library_song("h2", "Afterglow", "Neon Club", "house", 122.0, 0.82),
    ];
    harness.store_playlist("history", "History", &history);

    let songs = harness.playlists.load_playlist_songs("history").unwrap();
    let profile = UserMusicProfile::from_listening_history(&songs);
    assert_eq!(profile.favorite_genres, vec!["house"]);
    assert_eq!(profile.favorite_artists, vec!["Neon Club"]);

    let pool = harness.playlists.all_songs().unwrap();
    let scorer = RecommendationScorer::with_defaults();
    let ranked = scorer.rank(&pool, &profile, 10);

    assert!(!ranked.is_empty());
    // The house track by the favorite artist wins
    assert_eq!(ranked[0].song.id, "l1");
    assert!(ranked[0].reasons.iter().any(|r| r.contains("house")));
    for window in ranked.windows(2) {
        assert!(window[0].score >= window[1].score);
    }
}

#[test]
fn test_rank_dedups_same_song_across_catalogs() {
    let harness = TestHarness::new();
    let mut pool = seed_library(&harness);

    // The same recording listed on another catalog with a different ID
    let duplicate = Song::new(
        "dz-l1",
        "night drive",
        "NEON CLUB",
        210,
        Catalog::Deezer,
        "dz-1",
    )
    .with_genre("house");
    pool.push(duplicate);

    let history = vec![library_song("h1", "Warehouse", "Neon Club", "house", 126.0, 0.8)];
    let profile = UserMusicProfile::from_listening_history(&history);

    let scorer = RecommendationScorer::with_defaults();
    let ranked = scorer.rank(&pool, &profile, 10);

    let night_drives: Vec<_> = ranked
        .iter()
        .filter(|r| r.song.title.to_lowercase() == "night drive")
        .collect();
    assert_eq!(night_drives.len(), 1);
    // First occurrence in the pool wins
    assert_eq!(night_drives[0].song.id, "l1");
}

// ============================================================================
// Mood-driven ranking
// ============================================================================

#[test]
fn test_mood_ranking_over_stored_pool() {
    let harness = TestHarness::new();
    seed_library(&harness);

    let pool = harness.playlists.all_songs().unwrap();
    let scorer = RecommendationScorer::with_defaults();
    let party = mood_profile("party").unwrap();

    let ranked = scorer.rank_for_mood(party, &pool, None, 10);

    assert!(!ranked.is_empty());
    // "Night Drive": house genre + 124bpm/0.85 energy fits the party mood
    assert_eq!(ranked[0].song.id, "l1");
    assert!(ranked[0]
        .reasons
        .iter()
        .any(|r| r.contains("seeded from mood 'party'")));
}

#[test]
fn test_mood_ranking_merges_stored_profile() {
    let harness = TestHarness::new();
    seed_library(&harness);

    let history = vec![library_song("h1", "Gold Dust", "Brass Alley", "funk", 110.0, 0.7)];
    harness.store_playlist("history", "History", &history);
    let songs = harness.playlists.load_playlist_songs("history").unwrap();
    let profile = UserMusicProfile::from_listening_history(&songs);

    let pool = harness.playlists.all_songs().unwrap();
    let scorer = RecommendationScorer::with_defaults();
    let happy = mood_profile("happy").unwrap();

    let without_profile = scorer.rank_for_mood(happy, &pool, None, 10);
    let with_profile = scorer.rank_for_mood(happy, &pool, Some(&profile), 10);

    let score_of = |ranked: &[crosstune::recommendation::RecommendedSong], id: &str| {
        ranked
            .iter()
            .find(|r| r.song.id == id)
            .map(|r| r.score)
            .unwrap()
    };

    // The favorite-artist funk track gains from the profile merge
    assert!(score_of(&with_profile, "l5") > score_of(&without_profile, "l5"));
}

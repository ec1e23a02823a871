//! Search-query planning for cross-catalog matching.
//!
//! Produces an ordered list of query variants for a source song, most
//! specific first. Early variants favor precision, later ones recall; the
//! matcher runs all of them and keeps the globally best candidate.

use crate::catalog::Song;

/// Build the ordered query plan for a song. Never returns an empty plan for
/// a song with a title or artist.
///
/// Canonical ordering:
/// 1. `"<artist>" "<title>"` (quoted exact-phrase intent)
/// 2. `<artist> <title>`
/// 3. `<artist> <album>` (only if an album is present)
/// 4. `<title>` alone
/// 5. `<artist>` alone
pub fn plan(song: &Song) -> Vec<String> {
    let title = song.title.trim();
    let artist = song.artist.trim();
    let album = song.album.as_deref().map(str::trim).unwrap_or("");

    let mut queries = Vec::with_capacity(5);

    if !artist.is_empty() && !title.is_empty() {
        queries.push(format!("\"{}\" \"{}\"", artist, title));
        queries.push(format!("{} {}", artist, title));
    }
    if !artist.is_empty() && !album.is_empty() {
        queries.push(format!("{} {}", artist, album));
    }
    if !title.is_empty() {
        queries.push(title.to_string());
    }
    if !artist.is_empty() {
        queries.push(artist.to_string());
    }

    // Drop duplicates (e.g. a self-titled album) keeping the first occurrence
    let mut seen = std::collections::HashSet::new();
    queries.retain(|q| seen.insert(q.clone()));

    queries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn song(title: &str, artist: &str, album: Option<&str>) -> Song {
        let mut s = Song::new("s1", title, artist, 200, Catalog::Spotify, "sp-1");
        if let Some(album) = album {
            s = s.with_album(album);
        }
        s
    }

    #[test]
    fn test_full_plan_with_album() {
        let queries = plan(&song("Imagine", "John Lennon", Some("Imagine")));
        assert_eq!(
            queries,
            vec![
                "\"John Lennon\" \"Imagine\"",
                "John Lennon Imagine",
                // "<artist> <album>" collapses into the previous variant for
                // a self-titled album, so it is deduplicated away
                "Imagine",
                "John Lennon",
            ]
        );
    }

    #[test]
    fn test_plan_with_distinct_album() {
        let queries = plan(&song("Come Together", "The Beatles", Some("Abbey Road")));
        assert_eq!(
            queries,
            vec![
                "\"The Beatles\" \"Come Together\"",
                "The Beatles Come Together",
                "The Beatles Abbey Road",
                "Come Together",
                "The Beatles",
            ]
        );
    }

    #[test]
    fn test_plan_without_album() {
        let queries = plan(&song("Imagine", "John Lennon", None));
        assert_eq!(queries.len(), 4);
        assert!(!queries.iter().any(|q| q.contains("Abbey")));
    }

    #[test]
    fn test_plan_most_specific_first() {
        let queries = plan(&song("Imagine", "John Lennon", None));
        assert!(queries[0].starts_with('"'));
        assert_eq!(queries.last().unwrap(), "John Lennon");
    }

    #[test]
    fn test_plan_never_empty_with_title_only() {
        let queries = plan(&song("Imagine", "", None));
        assert_eq!(queries, vec!["Imagine"]);
    }

    #[test]
    fn test_plan_never_empty_with_artist_only() {
        let queries = plan(&song("", "John Lennon", None));
        assert_eq!(queries, vec!["John Lennon"]);
    }

    #[test]
    fn test_plan_trims_whitespace() {
        let queries = plan(&song("  Imagine ", " John Lennon ", None));
        assert_eq!(queries[1], "John Lennon Imagine");
    }
}

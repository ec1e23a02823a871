//! Similarity over audio descriptor vectors.
//!
//! Two modes serve two callers: a tight tolerance check used when deciding
//! whether a candidate is plausibly the same kind of song, and a soft scored
//! similarity used for ranking recommendations.

use serde::{Deserialize, Serialize};

use crate::catalog::AudioFeatures;

/// Per-dimension tolerances for the pass/fail mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureTolerance {
    pub danceability: f64,
    pub energy: f64,
    pub valence: f64,
}

impl Default for FeatureTolerance {
    fn default() -> Self {
        Self {
            danceability: 0.2,
            energy: 0.2,
            valence: 0.2,
        }
    }
}

/// Tolerance mode: does `candidate` sit within the per-dimension tolerance
/// of `reference` on danceability, energy and valence?
///
/// An absent vector on either side is a non-match.
pub fn within_tolerance(
    reference: Option<&AudioFeatures>,
    candidate: Option<&AudioFeatures>,
    tolerance: &FeatureTolerance,
) -> bool {
    let (reference, candidate) = match (reference, candidate) {
        (Some(r), Some(c)) => (r, c),
        _ => return false,
    };

    (reference.danceability - candidate.danceability).abs() <= tolerance.danceability
        && (reference.energy - candidate.energy).abs() <= tolerance.energy
        && (reference.valence - candidate.valence).abs() <= tolerance.valence
}

/// Scored mode: soft similarity in [0, 1] for ranking.
///
/// `1 - (|Δdanceability| + |Δenergy| + |Δvalence| + |Δtempo|/ref_tempo) / 4`,
/// clamped. The tempo delta is normalized by the reference tempo; a
/// non-positive reference tempo contributes a zero tempo term rather than
/// poisoning the score.
pub fn scored_similarity(reference: &AudioFeatures, candidate: &AudioFeatures) -> f64 {
    let tempo_term = if reference.tempo_bpm > 0.0 {
        (reference.tempo_bpm - candidate.tempo_bpm).abs() / reference.tempo_bpm
    } else {
        0.0
    };

    let distance = (reference.danceability - candidate.danceability).abs()
        + (reference.energy - candidate.energy).abs()
        + (reference.valence - candidate.valence).abs()
        + tempo_term;

    (1.0 - distance / 4.0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(danceability: f64, energy: f64, valence: f64, tempo: f64) -> AudioFeatures {
        AudioFeatures {
            danceability,
            energy,
            valence,
            tempo_bpm: tempo,
            ..AudioFeatures::default()
        }
    }

    #[test]
    fn test_within_tolerance_passes_close_vectors() {
        let a = features(0.5, 0.5, 0.5, 120.0);
        let b = features(0.6, 0.4, 0.55, 90.0);
        assert!(within_tolerance(
            Some(&a),
            Some(&b),
            &FeatureTolerance::default()
        ));
    }

    #[test]
    fn test_within_tolerance_rejects_any_axis() {
        let a = features(0.5, 0.5, 0.5, 120.0);
        let tolerance = FeatureTolerance::default();

        let off_dance = features(0.8, 0.5, 0.5, 120.0);
        let off_energy = features(0.5, 0.75, 0.5, 120.0);
        let off_valence = features(0.5, 0.5, 0.21, 120.0);

        assert!(!within_tolerance(Some(&a), Some(&off_dance), &tolerance));
        assert!(!within_tolerance(Some(&a), Some(&off_energy), &tolerance));
        // 0.5 -> 0.21 is a 0.29 delta
        assert!(!within_tolerance(Some(&a), Some(&off_valence), &tolerance));
    }

    #[test]
    fn test_within_tolerance_absent_vectors() {
        let a = features(0.5, 0.5, 0.5, 120.0);
        let tolerance = FeatureTolerance::default();
        assert!(!within_tolerance(Some(&a), None, &tolerance));
        assert!(!within_tolerance(None, Some(&a), &tolerance));
        assert!(!within_tolerance(None, None, &tolerance));
    }

    #[test]
    fn test_scored_similarity_identical() {
        let a = features(0.7, 0.6, 0.4, 128.0);
        assert_eq!(scored_similarity(&a, &a), 1.0);
    }

    #[test]
    fn test_scored_similarity_decreases_with_distance() {
        let reference = features(0.5, 0.5, 0.5, 120.0);
        let near = features(0.55, 0.5, 0.5, 120.0);
        let far = features(0.9, 0.2, 0.1, 60.0);

        let s_near = scored_similarity(&reference, &near);
        let s_far = scored_similarity(&reference, &far);
        assert!(s_near > s_far);
        assert!(s_near < 1.0);
    }

    #[test]
    fn test_scored_similarity_clamped() {
        let reference = features(0.0, 0.0, 0.0, 10.0);
        let candidate = features(1.0, 1.0, 1.0, 500.0);
        let s = scored_similarity(&reference, &candidate);
        assert!((0.0..=1.0).contains(&s));
        assert_eq!(s, 0.0);
    }

    #[test]
    fn test_scored_similarity_zero_reference_tempo() {
        let reference = features(0.5, 0.5, 0.5, 0.0);
        let candidate = features(0.5, 0.5, 0.5, 180.0);
        // Tempo term drops out entirely
        assert_eq!(scored_similarity(&reference, &candidate), 1.0);
    }
}

//! Final ordering of the scored universe.

use sources::Candidate;
use std::cmp::Ordering;

/// Sort by score descending and keep the first `limit` candidates.
///
/// The sort is stable: equal scores keep their input order, which is the
/// item-index order the sources produce. NaN scores rank below every other
/// score, disliked items included.
pub fn rank_top_n(mut candidates: Vec<Candidate>, limit: usize) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        rank_key(b.base_score)
            .partial_cmp(&rank_key(a.base_score))
            .unwrap_or(Ordering::Equal)
    });
    candidates.truncate(limit);
    candidates
}

fn rank_key(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sources::CandidateSource;

    fn scored(values: &[(&str, f32)]) -> Vec<Candidate> {
        values
            .iter()
            .enumerate()
            .map(|(i, (id, score))| Candidate::new(*id, CandidateSource::Popularity, *score).at_position(i))
            .collect()
    }

    fn ids(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.item_id.as_str()).collect()
    }

    #[test]
    fn test_descending_and_truncated() {
        let ranked = rank_top_n(scored(&[("A", 4.0), ("B", 3.0), ("C", 5.0)]), 2);
        assert_eq!(ids(&ranked), vec!["C", "A"]);
    }

    #[test]
    fn test_ties_keep_index_order() {
        let ranked = rank_top_n(scored(&[("A", 1.0), ("B", 2.0), ("C", 2.0), ("D", 2.0)]), 4);
        assert_eq!(ids(&ranked), vec!["B", "C", "D", "A"]);
    }

    #[test]
    fn test_limit_larger_than_universe() {
        let ranked = rank_top_n(scored(&[("A", 1.0), ("B", 2.0)]), 10);
        assert_eq!(ids(&ranked), vec!["B", "A"]);
    }

    #[test]
    fn test_nan_scores_sink_to_the_bottom() {
        let ranked = rank_top_n(scored(&[("A", 1.0), ("B", f32::NAN), ("C", 3.0)]), 3);
        assert_eq!(ids(&ranked), vec!["C", "A", "B"]);

        let ranked = rank_top_n(scored(&[("A", f32::NAN), ("B", f32::MIN), ("C", f32::NAN), ("D", 0.5)]), 4);
        assert_eq!(ids(&ranked), vec!["D", "B", "A", "C"]);
    }

    #[test]
    fn test_zero_limit() {
        assert!(rank_top_n(scored(&[("A", 1.0)]), 0).is_empty());
    }
}

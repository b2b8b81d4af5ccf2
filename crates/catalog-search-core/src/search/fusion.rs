// Min-max score normalization and weighted hybrid fusion

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Normalized value assigned to every score of a degenerate result set.
///
/// A set is degenerate when it has no spread: empty, a single element, or
/// all values equal. Min-max scaling is undefined there (zero range), and the
/// rule is that every member counts as a top match rather than dividing by
/// zero.
pub const DEGENERATE_NORMALIZED_SCORE: f32 = 1.0;

/// Linearly rescales `scores` so the minimum maps to 0.0 and the maximum to 1.0.
///
/// Normalization is relative to the slice passed in, which is always one
/// query's result set; values are not comparable across queries.
///
/// # Examples
///
/// ```
/// use catalog_search_core::search::fusion::min_max_normalize;
///
/// assert_eq!(min_max_normalize(&[2.0, 4.0, 3.0]), vec![0.0, 1.0, 0.5]);
/// assert_eq!(min_max_normalize(&[0.7, 0.7]), vec![1.0, 1.0]);
/// assert!(min_max_normalize(&[]).is_empty());
/// ```
pub fn min_max_normalize(scores: &[f32]) -> Vec<f32> {
    let min = scores.iter().copied().fold(f32::INFINITY, f32::min);
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = max - min;

    if scores.is_empty() || range <= 0.0 || !range.is_finite() {
        return vec![DEGENERATE_NORMALIZED_SCORE; scores.len()];
    }

    scores
        .iter()
        .map(|score| ((score - min) / range).clamp(0.0, 1.0))
        .collect()
}

/// Per-document scores produced by [`weighted_fusion`].
#[derive(Debug, Clone, PartialEq)]
pub struct FusedScore<T> {
    /// Item identifier
    pub id: T,
    /// Raw semantic score (0.0 if the item was not in the semantic ranking)
    pub semantic_raw: f32,
    /// Raw keyword score (0.0 if the item was not in the keyword ranking)
    pub keyword_raw: f32,
    /// Normalized semantic score over the union set
    pub semantic_normalized: f32,
    /// Normalized keyword score over the union set
    pub keyword_normalized: f32,
    /// Weighted sum of the normalized scores
    pub combined: f32,
}

/// Weights and cut-offs applied by [`weighted_fusion`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    /// Multiplier for the normalized semantic score
    pub semantic: f32,
    /// Multiplier for the normalized keyword score
    pub keyword: f32,
    /// Drop items whose combined score is below this
    pub min_score: f32,
    /// Keep at most this many items
    pub top_k: usize,
}

/// Merge two rankings by weighted sum of min-max normalized scores.
///
/// 1. Take the union of both id sets, so an item matched by only one signal
///    is kept.
/// 2. An item missing from a ranking takes that ranking's observed minimum,
///    so it normalizes to 0.0 and never outranks an observed match.
/// 3. Normalize each signal over the union. When a signal's observations
///    have no spread they all map to 1.0 and absent items stay at 0.0. A
///    signal with no observations at all contributes 0.0 to every item.
/// 4. `combined = semantic·norm_semantic + keyword·norm_keyword`.
/// 5. Drop `combined < min_score`, sort by combined descending with ties by
///    ascending id, keep `top_k`.
///
/// Weights are applied as given; with both at 1.0 combined scores reach 2.0
/// and `min_score` is compared against that range.
pub fn weighted_fusion<T: Clone + Ord>(
    semantic: &[(T, f32)],
    keyword: &[(T, f32)],
    weights: FusionWeights,
) -> Vec<FusedScore<T>> {
    let semantic_scores: BTreeMap<&T, f32> = semantic.iter().map(|(id, s)| (id, *s)).collect();
    let keyword_scores: BTreeMap<&T, f32> = keyword.iter().map(|(id, s)| (id, *s)).collect();

    let union: BTreeSet<&T> = semantic_scores
        .keys()
        .chain(keyword_scores.keys())
        .copied()
        .collect();
    let union: Vec<&T> = union.into_iter().collect();

    let semantic_normalized = normalize_over(&union, &semantic_scores);
    let keyword_normalized = normalize_over(&union, &keyword_scores);

    let mut fused: Vec<FusedScore<T>> = union
        .iter()
        .zip(semantic_normalized)
        .zip(keyword_normalized)
        .map(|((id, sem_norm), kw_norm)| FusedScore {
            id: (*id).clone(),
            semantic_raw: semantic_scores.get(id).copied().unwrap_or(0.0),
            keyword_raw: keyword_scores.get(id).copied().unwrap_or(0.0),
            semantic_normalized: sem_norm,
            keyword_normalized: kw_norm,
            combined: weights.semantic * sem_norm + weights.keyword * kw_norm,
        })
        .filter(|item| item.combined >= weights.min_score)
        .collect();

    fused.sort_by(|a, b| {
        b.combined
            .partial_cmp(&a.combined)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    fused.truncate(weights.top_k);
    fused
}

/// Normalizes one signal over `union`, filling absent items with the
/// signal's observed minimum.
fn normalize_over<T: Ord>(union: &[&T], observed: &BTreeMap<&T, f32>) -> Vec<f32> {
    if observed.is_empty() {
        return vec![0.0; union.len()];
    }

    let floor = observed.values().copied().fold(f32::INFINITY, f32::min);
    let ceiling = observed.values().copied().fold(f32::NEG_INFINITY, f32::max);

    // Without spread every filled value equals the floor, and the degenerate
    // rule would lift absent items to the top score.
    if ceiling - floor <= 0.0 || !(ceiling - floor).is_finite() {
        return union
            .iter()
            .map(|id| {
                if observed.contains_key(id) {
                    DEGENERATE_NORMALIZED_SCORE
                } else {
                    0.0
                }
            })
            .collect();
    }

    let raw: Vec<f32> = union
        .iter()
        .map(|id| observed.get(id).copied().unwrap_or(floor))
        .collect();
    min_max_normalize(&raw)
}

/// Sorts `(id, score)` pairs by score descending, ties by ascending id.
pub(crate) fn sort_ranked<T: Ord>(results: &mut [(T, f32)]) {
    results.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights(semantic: f32, keyword: f32) -> FusionWeights {
        FusionWeights {
            semantic,
            keyword,
            min_score: 0.0,
            top_k: 50,
        }
    }

    #[test]
    fn test_normalize_bounds() {
        let normalized = min_max_normalize(&[3.0, -1.0, 7.0, 0.5]);
        assert_eq!(normalized[2], 1.0);
        assert_eq!(normalized[1], 0.0);
        for value in &normalized {
            assert!((0.0..=1.0).contains(value));
        }
        assert!((normalized[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_degenerate_cases() {
        assert!(min_max_normalize(&[]).is_empty());
        assert_eq!(min_max_normalize(&[0.42]), vec![DEGENERATE_NORMALIZED_SCORE]);
        assert_eq!(
            min_max_normalize(&[5.0, 5.0, 5.0]),
            vec![DEGENERATE_NORMALIZED_SCORE; 3]
        );
    }

    #[test]
    fn test_normalize_preserves_order() {
        let raw = [0.1, 0.9, 0.4, 0.6];
        let normalized = min_max_normalize(&raw);
        for i in 0..raw.len() {
            for j in 0..raw.len() {
                if raw[i] < raw[j] {
                    assert!(normalized[i] < normalized[j]);
                }
            }
        }
    }

    #[test]
    fn test_union_keeps_single_signal_matches() {
        let semantic = vec![(1, 0.9)];
        let keyword = vec![(2, 4.0)];
        let fused = weighted_fusion(&semantic, &keyword, weights(0.6, 0.4));

        assert_eq!(fused.len(), 2);
        assert_eq!(fused[0].id, 1);
        assert!((fused[0].combined - 0.6).abs() < 1e-6);
        assert_eq!(fused[1].id, 2);
        assert!((fused[1].combined - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_absent_item_takes_observed_minimum() {
        // Item 3 has no semantic match; it normalizes like the weakest match.
        let semantic = vec![(1, 0.8), (2, 0.2)];
        let keyword = vec![(1, 1.0), (2, 2.0), (3, 3.0)];
        let fused = weighted_fusion(&semantic, &keyword, weights(1.0, 0.0));

        let item = |id| fused.iter().find(|f| f.id == id).unwrap();
        assert_eq!(item(1).semantic_normalized, 1.0);
        assert_eq!(item(2).semantic_normalized, 0.0);
        assert_eq!(item(3).semantic_normalized, 0.0);
        assert_eq!(item(3).semantic_raw, 0.0);
    }

    #[test]
    fn test_weakest_match_in_both_signals_drops_out() {
        let semantic = vec![("a", 0.9), ("b", 0.5)];
        let keyword = vec![("b", 5.0), ("c", 10.0)];
        let fused = weighted_fusion(
            &semantic,
            &keyword,
            FusionWeights {
                semantic: 0.6,
                keyword: 0.4,
                min_score: 0.3,
                top_k: 10,
            },
        );

        let ids: Vec<&str> = fused.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert!((fused[0].combined - 0.6).abs() < 1e-6);
        assert!((fused[1].combined - 0.4).abs() < 1e-6);

        let all = weighted_fusion(&semantic, &keyword, weights(0.6, 0.4));
        let b = all.iter().find(|f| f.id == "b").unwrap();
        assert_eq!(b.semantic_normalized, 0.0);
        assert_eq!(b.keyword_normalized, 0.0);
        assert_eq!(b.combined, 0.0);
    }

    #[test]
    fn test_single_observation_does_not_lift_absent_items() {
        let semantic = vec![(1, 0.9), (2, 0.4), (3, 0.1)];
        let keyword = vec![(1, 2.5)];
        let fused = weighted_fusion(&semantic, &keyword, weights(0.0, 1.0));

        let item = |id| fused.iter().find(|f| f.id == id).unwrap();
        assert_eq!(item(1).keyword_normalized, DEGENERATE_NORMALIZED_SCORE);
        assert_eq!(item(2).keyword_normalized, 0.0);
        assert_eq!(item(3).keyword_normalized, 0.0);
    }

    #[test]
    fn test_negative_scores_keep_their_order() {
        let semantic = vec![(1, 0.4), (2, -0.2), (3, -0.8)];
        let fused = weighted_fusion(&semantic, &[], weights(1.0, 0.0));

        let ids: Vec<u32> = fused.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!((fused[1].semantic_normalized - 0.5).abs() < 1e-6);
        assert_eq!(fused[2].semantic_normalized, 0.0);
    }

    #[test]
    fn test_signal_without_observations_contributes_zero() {
        let semantic: Vec<(u32, f32)> = vec![];
        let keyword = vec![(1, 2.0), (2, 1.0)];
        let fused = weighted_fusion(&semantic, &keyword, weights(0.6, 0.4));

        assert_eq!(fused.len(), 2);
        assert!(fused.iter().all(|f| f.semantic_normalized == 0.0));
        assert!((fused[0].combined - 0.4).abs() < 1e-6);
        assert_eq!(fused[1].combined, 0.0);
    }

    #[test]
    fn test_weight_extremes() {
        let semantic = vec![(1, 0.9), (2, 0.5), (3, 0.1)];
        let keyword = vec![(3, 9.0), (2, 5.0), (1, 1.0)];

        let semantic_only: Vec<u32> = weighted_fusion(&semantic, &keyword, weights(1.0, 0.0))
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(semantic_only, vec![1, 2, 3]);

        let keyword_only: Vec<u32> = weighted_fusion(&semantic, &keyword, weights(0.0, 1.0))
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(keyword_only, vec![3, 2, 1]);
    }

    #[test]
    fn test_weights_need_not_sum_to_one() {
        let semantic = vec![(1, 0.9), (2, 0.1)];
        let keyword = vec![(1, 3.0), (2, 1.0)];
        let fused = weighted_fusion(&semantic, &keyword, weights(1.0, 1.0));
        assert!((fused[0].combined - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_min_score_threshold() {
        let semantic = vec![(1, 0.9), (2, 0.5), (3, 0.1)];
        let keyword = vec![(1, 3.0), (2, 2.0), (3, 1.0)];
        let fused = weighted_fusion(
            &semantic,
            &keyword,
            FusionWeights {
                semantic: 0.6,
                keyword: 0.4,
                min_score: 0.3,
                top_k: 50,
            },
        );
        assert!(fused.iter().all(|f| f.combined >= 0.3));
        assert!(!fused.iter().any(|f| f.id == 3));
    }

    #[test]
    fn test_top_k_truncates_after_sort() {
        let semantic = vec![(1, 0.1), (2, 0.5), (3, 0.9)];
        let fused = weighted_fusion(
            &semantic,
            &[],
            FusionWeights {
                semantic: 1.0,
                keyword: 0.0,
                min_score: 0.0,
                top_k: 2,
            },
        );
        let ids: Vec<u32> = fused.into_iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn test_ties_broken_by_ascending_id() {
        let semantic = vec![("b", 0.5), ("a", 0.5)];
        let keyword = vec![("a", 1.0), ("b", 1.0)];
        let fused = weighted_fusion(&semantic, &keyword, weights(0.6, 0.4));
        let ids: Vec<&str> = fused.into_iter().map(|f| f.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_empty_inputs() {
        let fused = weighted_fusion::<u32>(&[], &[], weights(0.6, 0.4));
        assert!(fused.is_empty());
    }

    #[test]
    fn test_sort_ranked() {
        let mut results = vec![(2, 0.5), (1, 0.5), (3, 0.9)];
        sort_ranked(&mut results);
        assert_eq!(results, vec![(3, 0.9), (1, 0.5), (2, 0.5)]);
    }
}

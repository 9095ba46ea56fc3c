//! Similarity weight and per-pixel estimation.
//!
//! A candidate pixel q contributes its center intensity Iq to the target
//! pixel p with weight `exp(-d(p, q) / normalizer)`, where d is the squared
//! Euclidean distance between the S×S patches around p and q and
//! `normalizer = h²·S²`. The estimate is the weight-normalized average over
//! the whole search window, target patch included (self-similarity carries
//! weight 1).

use crate::float_trait::NlmFloat;
use crate::patches::PatchCache;

/// Weight-sum threshold below which the estimate falls back to the target's
/// own intensity. The self weight is exactly 1, so the accumulated
/// denominator cannot mathematically reach this; the guard turns the
/// reference algorithm's 0/0 into a defined value.
const WEIGHT_SUM_EPSILON: f64 = 1e-30;

/// Squared Euclidean distance between two equally sized patches.
#[inline]
pub fn squared_patch_distance<F: NlmFloat>(p: &[F], q: &[F]) -> F {
    debug_assert_eq!(p.len(), q.len());
    p.iter()
        .zip(q.iter())
        .map(|(&a, &b)| {
            let diff = a - b;
            diff * diff
        })
        .sum()
}

/// Exponential similarity weight for a squared patch distance.
#[inline]
pub fn similarity_weight<F: NlmFloat>(distance: F, normalizer: F) -> F {
    (-distance / normalizer).exp()
}

/// Normalized weighted average of candidate center intensities.
///
/// `candidates` yields (patch, center intensity) pairs; in the solver this
/// is the full B×B search window around the target, which always contains
/// the target itself. Returns `fallback` when the weight sum degenerates
/// (empty window or total underflow). The result clamps to [0, 255].
pub fn weighted_average<'a, F, I>(target: &[F], candidates: I, normalizer: F, fallback: F) -> F
where
    F: NlmFloat,
    I: IntoIterator<Item = (&'a [F], F)>,
{
    let mut numerator = F::zero();
    let mut denominator = F::zero();

    for (patch, center) in candidates {
        let distance = squared_patch_distance(target, patch);
        let weight = similarity_weight(distance, normalizer);
        numerator += weight * center;
        denominator += weight;
    }

    if denominator <= F::from_f64_c(WEIGHT_SUM_EPSILON) {
        return fallback.max(F::zero()).min(F::MAX_INTENSITY);
    }
    (numerator / denominator).max(F::zero()).min(F::MAX_INTENSITY)
}

/// Estimate one pixel from its search window in the patch cache.
///
/// `row` and `col` are search-extent coordinates of the target center;
/// `search_width` is `big_window / 2`. Extent coordinates of original-image
/// pixels start at `search_width`, so the window never leaves the extent.
#[inline]
pub fn estimate_pixel<F: NlmFloat>(
    cache: &PatchCache<F>,
    row: usize,
    col: usize,
    search_width: usize,
    normalizer: F,
) -> F {
    debug_assert!(row >= search_width && col >= search_width);
    let target = cache.patch(row, col);
    let window = (row - search_width..=row + search_width).flat_map(move |r| {
        (col - search_width..=col + search_width).map(move |c| (cache.patch(r, c), cache.center(r, c)))
    });
    weighted_average(target, window, normalizer, cache.center(row, col))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::padding::pad_reflect;
    use ndarray::Array2;

    #[test]
    fn test_distance_of_identical_patches_is_zero() {
        let p = [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        assert_eq!(squared_patch_distance(&p, &p), 0.0);
    }

    #[test]
    fn test_distance_known_value() {
        let p = [0.0f64; 9];
        let q = [2.0f64; 9];
        // 9 entries, each squared difference 4
        assert_eq!(squared_patch_distance(&p, &q), 36.0);
    }

    #[test]
    fn test_weight_decreases_with_distance() {
        let normalizer = 100.0f64;
        let w0 = similarity_weight(0.0, normalizer);
        let w1 = similarity_weight(10.0, normalizer);
        let w2 = similarity_weight(50.0, normalizer);

        assert_eq!(w0, 1.0, "zero distance must carry full weight");
        assert!(w1 > w2, "weight must decrease monotonically in distance");
        assert!(w2 > 0.0);
    }

    #[test]
    fn test_average_of_identical_candidates() {
        let target = [5.0f64; 9];
        let candidates = vec![(&target[..], 5.0), (&target[..], 5.0), (&target[..], 5.0)];
        let value = weighted_average(&target, candidates, 100.0, 0.0);
        assert_eq!(value, 5.0);
    }

    #[test]
    fn test_self_inclusion_dominates_for_small_normalizer() {
        let target = [10.0f64; 9];
        let far = [200.0f64; 9];
        let candidates = vec![(&target[..], 10.0), (&far[..], 200.0)];

        // Tiny normalizer: the far candidate's weight underflows to zero
        let value = weighted_average(&target, candidates, 1e-9, 10.0);
        assert_eq!(value, 10.0);
    }

    #[test]
    fn test_empty_window_falls_back() {
        let target = [10.0f64; 9];
        let value = weighted_average(&target, Vec::new(), 100.0, 42.0);
        assert_eq!(
            value, 42.0,
            "degenerate weight sum must resolve to the supplied fallback"
        );
    }

    #[test]
    fn test_result_clamps_to_intensity_range() {
        let target = [300.0f64; 9];
        let candidates = vec![(&target[..], 300.0)];
        let value = weighted_average(&target, candidates, 100.0, 0.0);
        assert_eq!(value, 255.0);

        let low = [-20.0f64; 9];
        let candidates = vec![(&low[..], -20.0)];
        let value = weighted_average(&low, candidates, 100.0, 0.0);
        assert_eq!(value, 0.0);
    }

    #[test]
    fn test_estimate_pixel_on_uniform_cache() {
        let image = Array2::<f64>::from_elem((6, 6), 42.0);
        let (small_window, big_window) = (3, 5);
        let search_width = big_window / 2;
        let wide = pad_reflect(image.view(), search_width + small_window / 2).unwrap();
        let cache = PatchCache::build(wide.view(), small_window, big_window);

        let normalizer = 30.0 * 30.0 * (small_window * small_window) as f64;
        let value = estimate_pixel(&cache, search_width, search_width, search_width, normalizer);
        assert_eq!(value, 42.0, "uniform neighborhoods must average to themselves");
    }
}

//! NLM driver: orchestrates padding, patch caching, and per-pixel
//! estimation across the whole image.

use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;

use crate::error::NlmError;
use crate::estimator::estimate_pixel;
use crate::float_trait::NlmFloat;
use crate::padding::pad_reflect;
use crate::patches::PatchCache;

// =============================================================================
// Constants
// =============================================================================

/// Default smoothing parameter. Larger h weighs dissimilar patches more
/// evenly and produces a smoother, blurrier result.
const DEFAULT_H: f64 = 30.0;

/// Default patch (small window) size.
const DEFAULT_SMALL_WINDOW: usize = 7;

/// Default search (big window) size.
const DEFAULT_BIG_WINDOW: usize = 21;

// =============================================================================
// Configuration
// =============================================================================

/// NLM parameters.
///
/// Use `Default::default()` for the library defaults (h = 30, patch 7,
/// search window 21). The algorithm reads nothing but this struct and the
/// input image; there is no ambient configuration.
#[derive(Debug, Clone, Copy)]
pub struct NlmConfig<F: NlmFloat> {
    /// Smoothing parameter, must be positive and finite. Default: 30.0
    pub h: F,
    /// Patch size S, odd. Default: 7
    pub small_window: usize,
    /// Search window size B, odd, at least S. Default: 21
    pub big_window: usize,
}

impl<F: NlmFloat> Default for NlmConfig<F> {
    fn default() -> Self {
        Self {
            h: F::from_f64_c(DEFAULT_H),
            small_window: DEFAULT_SMALL_WINDOW,
            big_window: DEFAULT_BIG_WINDOW,
        }
    }
}

impl<F: NlmFloat> NlmConfig<F> {
    /// Create a configuration with the given parameters.
    pub fn new(h: F, small_window: usize, big_window: usize) -> Self {
        Self {
            h,
            small_window,
            big_window,
        }
    }

    /// Validate the configuration parameters.
    pub fn validate(&self) -> Result<(), NlmError> {
        if !(self.h > F::zero()) || !self.h.is_finite() {
            return Err(NlmError::invalid("h must be positive and finite"));
        }
        if self.small_window % 2 == 0 {
            return Err(NlmError::invalid("small_window must be odd"));
        }
        if self.big_window % 2 == 0 {
            return Err(NlmError::invalid("big_window must be odd"));
        }
        if self.small_window > self.big_window {
            return Err(NlmError::invalid("small_window must not exceed big_window"));
        }
        Ok(())
    }

    /// Weight normalizer h²·S².
    fn normalizer(&self) -> F {
        self.h * self.h * F::usize_as(self.small_window * self.small_window)
    }
}

// =============================================================================
// Driver
// =============================================================================

/// Denoise `image` with Non-Local Means.
///
/// Pads the image with reflected borders, precomputes all patches, then
/// estimates every pixel from its B×B search window. The output has the
/// input's shape and every value lies in [0, 255].
///
/// Rows are processed in parallel; each pixel's accumulation order over its
/// window is fixed, every output cell is written exactly once, and the
/// patch cache is read-only, so identical inputs give bit-identical results
/// regardless of thread count.
///
/// Fails with `InvalidParameter` for even window sizes, `small_window >
/// big_window`, non-positive `h`, or windows too large for the image (the
/// reflected padding must fit inside one mirror fold).
pub fn solve<F: NlmFloat>(
    image: ArrayView2<F>,
    config: &NlmConfig<F>,
) -> Result<Array2<F>, NlmError> {
    config.validate()?;

    let (height, width) = image.dim();
    let search_width = config.big_window / 2;
    let patch_width = config.small_window / 2;

    // Errors here cover the empty image and windows larger than the image
    let wide = pad_reflect(image, search_width + patch_width)?;
    let cache = PatchCache::build(wide.view(), config.small_window, config.big_window);
    let normalizer = config.normalizer();

    let rows: Vec<Vec<F>> = (0..height)
        .into_par_iter()
        .map(|i| {
            let row = i + search_width;
            (0..width)
                .map(|j| {
                    estimate_pixel(&cache, row, j + search_width, search_width, normalizer)
                })
                .collect()
        })
        .collect();

    let mut output = Array2::zeros((height, width));
    for (i, row) in rows.into_iter().enumerate() {
        for (j, value) in row.into_iter().enumerate() {
            output[[i, j]] = value;
        }
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use rand::prelude::*;

    fn random_image(rows: usize, cols: usize, seed: u64) -> Array2<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        Array2::from_shape_fn((rows, cols), |_| rng.gen::<f64>() * 255.0)
    }

    fn small_config() -> NlmConfig<f64> {
        NlmConfig::new(15.0, 3, 7)
    }

    #[test]
    fn test_output_shape_and_range() {
        let image = random_image(12, 9, 42);
        let denoised = solve(image.view(), &small_config()).unwrap();

        assert_eq!(denoised.dim(), (12, 9));
        for &v in denoised.iter() {
            assert!(
                (0.0..=255.0).contains(&v),
                "output value {} outside [0, 255]",
                v
            );
        }
    }

    #[test]
    fn test_deterministic() {
        let image = random_image(16, 16, 7);
        let config = small_config();

        let first = solve(image.view(), &config).unwrap();
        let second = solve(image.view(), &config).unwrap();
        assert_eq!(
            first, second,
            "identical inputs must produce bit-identical outputs"
        );
    }

    #[test]
    fn test_uniform_image_is_fixed_point() {
        let image = Array2::<f64>::from_elem((10, 10), 42.0);

        for (h, small_window, big_window) in [(0.5, 3, 5), (15.0, 3, 7), (200.0, 5, 9)] {
            let config = NlmConfig::new(h, small_window, big_window);
            let denoised = solve(image.view(), &config).unwrap();
            for &v in denoised.iter() {
                assert_eq!(
                    v, 42.0,
                    "uniform image must pass through unchanged (h={h}, S={small_window}, B={big_window})"
                );
            }
        }
    }

    #[test]
    fn test_large_h_approaches_window_mean() {
        // With the normalizer blown up, every candidate weighs the same and
        // the estimate collapses to the search-window mean over the
        // reflected neighborhood.
        let image = random_image(8, 8, 99);
        let config = NlmConfig::new(1.0e6, 3, 5);
        let denoised = solve(image.view(), &config).unwrap();

        let search_width = config.big_window / 2;
        let padded = crate::padding::pad_reflect(image.view(), search_width).unwrap();
        for i in 0..8 {
            for j in 0..8 {
                let mut sum = 0.0;
                for r in 0..config.big_window {
                    for c in 0..config.big_window {
                        sum += padded[[i + r, j + c]];
                    }
                }
                let mean = sum / (config.big_window * config.big_window) as f64;
                assert!(
                    (denoised[[i, j]] - mean).abs() < 1e-3,
                    "pixel ({i},{j}): {} should approach window mean {}",
                    denoised[[i, j]],
                    mean
                );
            }
        }
    }

    #[test]
    fn test_small_h_approaches_identity() {
        // With a vanishing normalizer, only zero-distance candidates keep
        // weight, and any zero-distance patch shares the target's center.
        let image = random_image(10, 10, 1234);
        let config = NlmConfig::new(1.0e-6, 3, 5);
        let denoised = solve(image.view(), &config).unwrap();

        for ((i, j), &v) in denoised.indexed_iter() {
            assert!(
                (v - image[[i, j]]).abs() < 1e-9,
                "pixel ({i},{j}): {} should stay near input {}",
                v,
                image[[i, j]]
            );
        }
    }

    #[test]
    fn test_smoothing_reduces_noise_variance() {
        // Noisy constant image: denoising must pull values toward the mean.
        let mut rng = StdRng::seed_from_u64(5);
        let normal = rand_distr::Normal::new(0.0f64, 10.0).unwrap();
        let image = Array2::from_shape_fn((16, 16), |_| 128.0 + normal.sample(&mut rng));

        let denoised = solve(image.view(), &NlmConfig::new(25.0, 3, 9)).unwrap();

        let var = |a: &Array2<f64>| {
            let mean = a.iter().sum::<f64>() / a.len() as f64;
            a.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (a.len() - 1) as f64
        };
        assert!(
            var(&denoised) < var(&image),
            "denoised variance {} should drop below noisy variance {}",
            var(&denoised),
            var(&image)
        );
    }

    #[test]
    fn test_rejects_even_windows() {
        let image = random_image(8, 8, 0);
        for config in [NlmConfig::new(15.0, 4, 7), NlmConfig::new(15.0, 3, 8)] {
            let err = solve(image.view(), &config).unwrap_err();
            assert!(matches!(err, NlmError::InvalidParameter(_)));
        }
    }

    #[test]
    fn test_rejects_small_window_above_big_window() {
        let image = random_image(8, 8, 0);
        let err = solve(image.view(), &NlmConfig::new(15.0, 7, 5)).unwrap_err();
        assert!(matches!(err, NlmError::InvalidParameter(_)));
    }

    #[test]
    fn test_rejects_non_positive_h() {
        let image = random_image(8, 8, 0);
        for h in [0.0, -3.0, f64::NAN] {
            let err = solve(image.view(), &NlmConfig::new(h, 3, 5)).unwrap_err();
            assert!(matches!(err, NlmError::InvalidParameter(_)));
        }
    }

    #[test]
    fn test_rejects_window_larger_than_image() {
        // Default 21x21 search window cannot pad a 4x4 image
        let image = random_image(4, 4, 0);
        let err = solve(image.view(), &NlmConfig::default()).unwrap_err();
        assert!(matches!(err, NlmError::InvalidParameter(_)));
    }

    #[test]
    fn test_non_square_image() {
        let image = random_image(9, 14, 21);
        let denoised = solve(image.view(), &small_config()).unwrap();
        assert_eq!(denoised.dim(), (9, 14));
    }

    #[test]
    fn test_f32_support() {
        let mut rng = StdRng::seed_from_u64(8);
        let image = Array2::<f32>::from_shape_fn((10, 10), |_| rng.gen::<f32>() * 255.0);
        let denoised = solve(image.view(), &NlmConfig::<f32>::new(15.0, 3, 7)).unwrap();

        assert_eq!(denoised.dim(), (10, 10));
        for &v in denoised.iter() {
            assert!((0.0..=255.0).contains(&v));
        }
    }
}

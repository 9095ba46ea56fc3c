//! Image quality metrics.
//!
//! CNR quantifies image quality by comparing the contrast between a region
//! of interest and its background relative to noise; higher means clearer
//! detail. CV is the ratio of standard deviation to mean of a region, a
//! unit-less measure of relative variability. Both operate over boolean
//! region masks and are pure and read-only.

use ndarray::{Array2, ArrayView2};

use crate::error::NlmError;
use crate::float_trait::NlmFloat;

/// Default delta degrees of freedom for sample variance.
const DEFAULT_DDOF: usize = 1;

/// Default epsilon guarding divisions when a region is exactly uniform.
const DEFAULT_EPS: f64 = 1e-12;

/// Shared knobs for both metrics.
#[derive(Debug, Clone, Copy)]
pub struct MetricParams<F: NlmFloat> {
    /// Delta degrees of freedom subtracted in the variance denominator.
    /// Default: 1 (sample variance).
    pub ddof: usize,
    /// Stabilizer added to metric denominators. Default: 1e-12
    pub eps: F,
}

impl<F: NlmFloat> Default for MetricParams<F> {
    fn default() -> Self {
        Self {
            ddof: DEFAULT_DDOF,
            eps: F::from_f64_c(DEFAULT_EPS),
        }
    }
}

/// Contrast-to-noise ratio between a signal region and a background region:
/// `|mean(signal) - mean(background)| / (sqrt(var(signal) + var(background)) + eps)`.
///
/// Fails with `InvalidParameter` when a mask's shape differs from the image
/// or selects fewer than `ddof + 1` pixels (sample variance undefined).
pub fn cnr<F: NlmFloat>(
    image: ArrayView2<F>,
    signal_mask: ArrayView2<bool>,
    background_mask: ArrayView2<bool>,
    params: MetricParams<F>,
) -> Result<F, NlmError> {
    let signal = masked_values(image, signal_mask, params.ddof, "signal mask")?;
    let background = masked_values(image, background_mask, params.ddof, "background mask")?;

    let (mu_s, var_s) = mean_and_variance(&signal, params.ddof);
    let (mu_b, var_b) = mean_and_variance(&background, params.ddof);

    Ok((mu_s - mu_b).abs() / ((var_s + var_b).sqrt() + params.eps))
}

/// Coefficient of variation of a masked region:
/// `std(selected) / (|mean(selected)| + eps)`.
///
/// Returns `Ok(None)` when no mask is supplied; whole-image CV is not a
/// defined use here. Fails with `InvalidParameter` on shape mismatch or
/// when the mask selects fewer than `ddof + 1` pixels.
pub fn cv<F: NlmFloat>(
    image: ArrayView2<F>,
    mask: Option<ArrayView2<bool>>,
    params: MetricParams<F>,
) -> Result<Option<F>, NlmError> {
    let Some(mask) = mask else {
        return Ok(None);
    };
    let selected = masked_values(image, mask, params.ddof, "mask")?;
    let (mean, variance) = mean_and_variance(&selected, params.ddof);
    Ok(Some(variance.sqrt() / (mean.abs() + params.eps)))
}

/// Rectangle region-of-interest mask: rows `top..bottom`, columns
/// `left..right`, half-open and clipped to the image shape.
pub fn region_mask(
    shape: (usize, usize),
    top: usize,
    bottom: usize,
    left: usize,
    right: usize,
) -> Array2<bool> {
    let (rows, cols) = shape;
    Array2::from_shape_fn((rows, cols), |(r, c)| {
        (top..bottom.min(rows)).contains(&r) && (left..right.min(cols)).contains(&c)
    })
}

/// Collect the intensities selected by `mask`, insisting on enough samples
/// for a ddof-corrected variance.
fn masked_values<F: NlmFloat>(
    image: ArrayView2<F>,
    mask: ArrayView2<bool>,
    ddof: usize,
    what: &str,
) -> Result<Vec<F>, NlmError> {
    if image.dim() != mask.dim() {
        return Err(NlmError::invalid(format!(
            "{} shape {:?} does not match image shape {:?}",
            what,
            mask.dim(),
            image.dim()
        )));
    }

    let values: Vec<F> = image
        .iter()
        .zip(mask.iter())
        .filter_map(|(&v, &selected)| selected.then_some(v))
        .collect();

    if values.len() < ddof + 1 {
        return Err(NlmError::invalid(format!(
            "{} selects {} pixels, need at least {}",
            what,
            values.len(),
            ddof + 1
        )));
    }
    Ok(values)
}

/// Mean and ddof-corrected variance of a sample. Caller guarantees
/// `values.len() > ddof`.
fn mean_and_variance<F: NlmFloat>(values: &[F], ddof: usize) -> (F, F) {
    let n = F::usize_as(values.len());
    let mean = values.iter().copied().sum::<F>() / n;
    let sum_sq: F = values
        .iter()
        .map(|&v| {
            let d = v - mean;
            d * d
        })
        .sum();
    let variance = sum_sq / F::usize_as(values.len() - ddof);
    (mean, variance)
}

//! Precomputed patch cache.
//!
//! The estimator compares the patch around a target pixel against the patch
//! around every candidate in its search window, so each patch is read O(B²)
//! times. This cache extracts every S×S patch once up front and stores them
//! contiguously, trading O(H·W·S²) memory for slice-free inner loops.

use ndarray::ArrayView2;

use crate::float_trait::NlmFloat;

/// All S×S patches whose centers lie in the search extent
/// (H + 2·bigWidth) × (W + 2·bigWidth).
///
/// Patches are stored row-major in one flat buffer, one `S²` block per
/// center. Built from an image padded by `big_window/2 + small_window/2`,
/// so every center in the extent has a fully in-bounds patch, including the
/// ring outside the original image that search windows of border pixels
/// reach into.
pub struct PatchCache<F> {
    patch_size: usize,
    patch_area: usize,
    extent_rows: usize,
    extent_cols: usize,
    data: Vec<F>,
}

impl<F: NlmFloat> PatchCache<F> {
    /// Extract every patch of the search extent from `wide`, an image padded
    /// by `big_window/2 + small_window/2` around the original H×W frame.
    ///
    /// Preconditions (enforced by the solver before the pad): `small_window`
    /// and `big_window` odd, `small_window <= big_window`, and `wide` of
    /// shape (H + 2·bigWidth + 2·smallWidth, W + 2·bigWidth + 2·smallWidth).
    pub fn build(wide: ArrayView2<F>, small_window: usize, big_window: usize) -> Self {
        let small_width = small_window / 2;
        debug_assert!(small_window % 2 == 1 && big_window % 2 == 1);
        debug_assert!(small_window <= big_window);

        let (wide_rows, wide_cols) = wide.dim();
        debug_assert!(wide_rows >= small_window && wide_cols >= small_window);

        // Search-extent coordinates: (r, c) here corresponds to
        // (r + small_width, c + small_width) in the wide frame, and to
        // (r - big_window/2, c - big_window/2) in the original image frame.
        let extent_rows = wide_rows - 2 * small_width;
        let extent_cols = wide_cols - 2 * small_width;

        let patch_area = small_window * small_window;
        let mut data = Vec::with_capacity(extent_rows * extent_cols * patch_area);
        for r in 0..extent_rows {
            for c in 0..extent_cols {
                for pr in 0..small_window {
                    for pc in 0..small_window {
                        data.push(wide[[r + pr, c + pc]]);
                    }
                }
            }
        }

        Self {
            patch_size: small_window,
            patch_area,
            extent_rows,
            extent_cols,
            data,
        }
    }

    /// Patch size S.
    pub fn patch_size(&self) -> usize {
        self.patch_size
    }

    /// Search-extent dimensions (rows, cols).
    pub fn extent(&self) -> (usize, usize) {
        (self.extent_rows, self.extent_cols)
    }

    /// The S² intensities of the patch centered at extent coordinate
    /// (row, col), row-major.
    #[inline]
    pub fn patch(&self, row: usize, col: usize) -> &[F] {
        let start = (row * self.extent_cols + col) * self.patch_area;
        &self.data[start..start + self.patch_area]
    }

    /// Center intensity of the patch at extent coordinate (row, col).
    #[inline]
    pub fn center(&self, row: usize, col: usize) -> F {
        self.patch(row, col)[self.patch_area / 2]
    }
}

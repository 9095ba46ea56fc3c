//! Reflected boundary padding.
//!
//! Extends an image so that full search windows exist at every original
//! pixel. Uses reflect-at-edge semantics: the border pixel is the mirror
//! axis and is not duplicated, so `[a b c d]` padded by 2 becomes
//! `[c b a b c d c b]`. No wrap-around, no constant fill.

use ndarray::{Array2, ArrayView2};

use crate::error::NlmError;
use crate::float_trait::NlmFloat;

/// Map an offset coordinate back into `0..len` by mirroring across the
/// boundary sample. Valid only when one fold suffices, which the padding
/// width check guarantees.
#[inline]
fn reflect_index(idx: isize, len: usize) -> usize {
    let last = (len - 1) as isize;
    let mut i = idx;
    if i < 0 {
        i = -i;
    }
    if i > last {
        i = 2 * last - i;
    }
    i as usize
}

/// Pad `image` by `width` pixels on every side with reflected border values.
///
/// The central region of the result is bit-identical to the input. Fails
/// with `InvalidParameter` when the image is empty or when `width` is not
/// strictly smaller than both image dimensions, since reflection is
/// undefined beyond one full mirror.
pub fn pad_reflect<F: NlmFloat>(
    image: ArrayView2<F>,
    width: usize,
) -> Result<Array2<F>, NlmError> {
    let (rows, cols) = image.dim();
    if rows == 0 || cols == 0 {
        return Err(NlmError::invalid("image must be non-empty"));
    }
    if width >= rows || width >= cols {
        return Err(NlmError::invalid(format!(
            "padding width {} exceeds image dimensions {}x{}",
            width, rows, cols
        )));
    }

    let w = width as isize;
    Ok(Array2::from_shape_fn(
        (rows + 2 * width, cols + 2 * width),
        |(r, c)| {
            let src_r = reflect_index(r as isize - w, rows);
            let src_c = reflect_index(c as isize - w, cols);
            image[[src_r, src_c]]
        },
    ))
}

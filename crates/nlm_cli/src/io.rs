//! Grayscale image I/O.
//!
//! The core operates on `Array2<f64>` intensities in 0..255; this module
//! converts to and from 8-bit grayscale rasters. Any format the `image`
//! crate decodes is accepted; color inputs are collapsed to luma on load.

use anyhow::{Context, Result};
use image::{GrayImage, Luma};
use ndarray::{Array2, ArrayView2};
use std::fs;
use std::path::Path;

/// Decode an image file into a grayscale float array.
pub fn load_grayscale(path: &Path) -> Result<Array2<f64>> {
    let gray = image::open(path)
        .with_context(|| format!("failed to read image {}", path.display()))?
        .to_luma8();
    Ok(gray_to_array(&gray))
}

/// Clamp to [0, 255], quantize to 8 bits, and encode to `path` (format
/// chosen from the extension). Parent directories are created on demand.
pub fn save_grayscale(image: ArrayView2<f64>, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }
    array_to_gray(image)
        .save(path)
        .with_context(|| format!("failed to write image {}", path.display()))
}

fn gray_to_array(gray: &GrayImage) -> Array2<f64> {
    let (width, height) = gray.dimensions();
    Array2::from_shape_fn((height as usize, width as usize), |(r, c)| {
        f64::from(gray.get_pixel(c as u32, r as u32)[0])
    })
}

fn array_to_gray(image: ArrayView2<f64>) -> GrayImage {
    let (rows, cols) = image.dim();
    let mut out = GrayImage::new(cols as u32, rows as u32);
    for ((r, c), &value) in image.indexed_iter() {
        let quantized = value.clamp(0.0, 255.0).round() as u8;
        out.put_pixel(c as u32, r as u32, Luma([quantized]));
    }
    out
}

//! Single-image and dataset batch drivers.
//!
//! Each image is denoised independently with its own padded working set, so
//! batch mode simply loops; one `solve` call already saturates the thread
//! pool. CNR and CV are reported for the original and denoised images over
//! fixed regions of interest.

use anyhow::{Context, Result};
use log::{info, warn};
use ndarray::ArrayView2;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use nlm_core::{cnr, cv, region_mask, solve, MetricParams, NlmConfig, NlmError};

use crate::config::RunConfig;
use crate::io;

/// Signal region of interest for metric reporting (rows and columns).
const SIGNAL_ROI: (usize, usize) = (85, 135);

/// Background region of interest for metric reporting (rows and columns).
const BACKGROUND_ROI: (usize, usize) = (0, 50);

/// Image extensions picked up when scanning the dataset tree.
const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

/// Denoise the single image named in the configuration.
pub fn run_single(run: &RunConfig, nlm: &NlmConfig<f64>, save: bool) -> Result<()> {
    let input = run
        .single_image
        .as_deref()
        .context("config is missing single_image")?;
    let output = run.save_path.join(result_name(nlm));
    denoise_one(input, &output, nlm, save)
}

/// Denoise every image in the dataset tree: one subdirectory per group,
/// images inside, written flat under the save path.
pub fn run_dataset(run: &RunConfig, nlm: &NlmConfig<f64>, save: bool) -> Result<()> {
    let started = Instant::now();
    let mut processed = 0usize;

    for dir in subdirectories(&run.data_path)? {
        info!("processing directory {}", dir.display());
        for path in image_files(&dir)? {
            let name = path
                .file_name()
                .with_context(|| format!("invalid image path {}", path.display()))?;
            denoise_one(&path, &run.save_path.join(name), nlm, save)?;
            processed += 1;
        }
    }

    info!(
        "{} images processed, time took: {:.2?}",
        processed,
        started.elapsed()
    );
    Ok(())
}

fn denoise_one(input: &Path, output: &Path, nlm: &NlmConfig<f64>, save: bool) -> Result<()> {
    info!("reading image from {}", input.display());
    let image = io::load_grayscale(input)?;

    let started = Instant::now();
    let denoised = solve(image.view(), nlm)
        .with_context(|| format!("failed to denoise {}", input.display()))?;
    info!(
        "time took to process image: {:.2?} ({})",
        started.elapsed(),
        input.display()
    );

    report_metrics(image.view(), denoised.view());

    if save {
        io::save_grayscale(denoised.view(), output)?;
        info!("saved denoised image to {}", output.display());
    }
    Ok(())
}

/// Log CNR and CV for the original and denoised images. Images too small
/// for the fixed regions of interest are reported as a warning, not a
/// failure of the run.
fn report_metrics(original: ArrayView2<'_, f64>, denoised: ArrayView2<'_, f64>) {
    match (roi_metrics(original), roi_metrics(denoised)) {
        (Ok((cnr_orig, cv_orig)), Ok((cnr_den, cv_den))) => {
            info!("CNRs: original: {:.2} denoised: {:.2}", cnr_orig, cnr_den);
            info!("CVs: original: {:.2} denoised: {:.2}", cv_orig, cv_den);
        }
        (Err(err), _) | (_, Err(err)) => {
            warn!("skipping metric report: {}", err);
        }
    }
}

fn roi_metrics(image: ArrayView2<'_, f64>) -> Result<(f64, f64), NlmError> {
    let shape = image.dim();
    let signal = region_mask(shape, SIGNAL_ROI.0, SIGNAL_ROI.1, SIGNAL_ROI.0, SIGNAL_ROI.1);
    let background = region_mask(
        shape,
        BACKGROUND_ROI.0,
        BACKGROUND_ROI.1,
        BACKGROUND_ROI.0,
        BACKGROUND_ROI.1,
    );
    let params = MetricParams::default();

    let contrast = cnr(image, signal.view(), background.view(), params)?;
    let variation = cv(image, Some(signal.view()), params)?.unwrap_or_default();
    Ok((contrast, variation))
}

fn result_name(nlm: &NlmConfig<f64>) -> String {
    format!(
        "result_{}_{}_{}.png",
        nlm.h, nlm.small_window, nlm.big_window
    )
}

fn subdirectories(root: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(root)
        .with_context(|| format!("failed to read dataset directory {}", root.display()))?;

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn image_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && has_supported_extension(path))
        .collect();
    files.sort();
    Ok(files)
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
